fn main() {
    if let Err(err) = lightkit::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
