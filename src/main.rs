fn main() {
    if let Err(err) = ppdmat::cli::run() {
        ppdmat::ui::eprintln_error(&err);
        std::process::exit(ppdmat::exit::exit_code(&err));
    }
}
