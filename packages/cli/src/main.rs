use clap::Parser;
use shadow_cli::Cli;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match shadow_cli::run(&cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
