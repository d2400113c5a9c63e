fn main() {
    if let Err(err) = labelizer_lib::run() {
        eprintln!("labelizer: {err:#}");
        std::process::exit(1);
    }
}
