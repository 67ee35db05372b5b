use clap::Parser;
use nestegg::api::cli::{Cli, Command, render_command};

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Command::Serve { port } = cli.command {
        if let Err(e) = nestegg::api::run_http_server(port).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match render_command(&cli.command) {
        Ok(output) => {
            print!("{}", output.body);
            if output.exit_code != 0 {
                std::process::exit(output.exit_code);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    }
}
