fn main() {
    if let Err(err) = pipark_setup::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
