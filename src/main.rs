fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if handle_cli_flags(&args) {
        return;
    }

    if let Err(err) = snipbox::run(&args) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(args: &[String]) -> bool {
    let mut saw_flag = false;
    for arg in args {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("snipbox {}", snipbox::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "snipbox - Keep and browse code snippets from the terminal.\n\n  snipbox                        Open the interactive view\n  snipbox list                   List snippets, one label per line\n  snipbox <name>                 Print the best fuzzy match to stdout\n  <cmd> | snipbox [f/name.ext]   Save stdin as a new snippet\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
