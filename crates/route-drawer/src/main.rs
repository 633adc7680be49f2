use route_drawer::{Settings, run, setup_logging};

fn main() {
    let settings = Settings::from_cli();
    setup_logging(settings.verbose);

    match run(&settings) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
