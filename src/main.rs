use std::process;

fn main() {
    if let Err(err) = lotsync::run() {
        eprintln!("{err}");
        process::exit(1);
    }
}
