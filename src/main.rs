fn main() {
    if let Err(err) = table_compare::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
