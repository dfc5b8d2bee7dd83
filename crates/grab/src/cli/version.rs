pub fn banner() -> String {
    format!("grab file downloader - {}", env!("CARGO_PKG_VERSION"))
}

pub fn run() {
    println!("{}", banner());
}
