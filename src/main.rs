fn main() {
    if let Err(err) = prereq_graph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
