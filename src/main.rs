fn main() {
    if let Err(err) = plantcare_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
