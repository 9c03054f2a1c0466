fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = kwoon::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Kwoon {}", kwoon::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Kwoon — Wing Chun learning platform from the terminal.\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message\n\nThe backend base URL comes from ~/.config/kwoon/config.yaml or KWOON_API__BASE_URL."
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
