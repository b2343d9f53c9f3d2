fn main() {
    if let Err(e) = wabbitc_drv::main() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
