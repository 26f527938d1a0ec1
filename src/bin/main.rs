use dotenv::dotenv;

use clap::{Arg, Command};

use verso::{app::*, error::*};

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = Command::new("verso")
    .about("Article publishing backend")
    .arg(Arg::new("config")
      .short('c')
      .long("config")
      .value_name("FILE")
      .takes_value(true)
      .help("Config file to load instead of conf/$RUN_MODE"))
    .subcommand(Command::new("migrate").about("Create or update the database schema"))
    .subcommand(Command::new("check").about("Check the database connection"))
    .get_matches();

  let config = AppConfig::new_clap(&cli)?;

  match cli.subcommand_name() {
    Some("check") => check::execute(config)?,
    // default to 'migrate' command.
    _ => migrate::execute(config)?,
  }
  log::info!("Main finished");
  Ok(())
}
