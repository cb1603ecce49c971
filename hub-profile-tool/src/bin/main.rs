use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use hub_profile_tool::CONFIG_PAGE_SIZE;

#[derive(Parser)]
#[command(name = "hub-profile-tool")]
#[command(about = "Panel hub profile image and packet tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a config page image from a profile payload
    Image {
        /// Profile payload as hex, at most 63 bytes
        payload: String,

        /// Output binary file path
        output: PathBuf,
    },
    /// Show the profile stored in a config page image
    Inspect {
        /// Input binary file path
        input: PathBuf,
    },
    /// Print the bytes of a config mode HID packet as hex
    Packet {
        #[command(subcommand)]
        kind: PacketCommands,
    },
}

#[derive(Subcommand)]
enum PacketCommands {
    /// Packet storing a profile
    Push {
        /// Profile payload as hex, at most 63 bytes
        payload: String,
    },
    /// Packet requesting the stored profile
    Read,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Image { payload, output } => {
            let profile = hub_profile_tool::parse_payload(&payload)?;

            println!("Generating config page image...");
            hub_profile_tool::build_image_file(&profile, &output)?;

            println!("Successfully generated config page: {}", output.display());
            println!("Size: {} bytes", CONFIG_PAGE_SIZE);
            println!("Checksum: 0x{:02X}", profile.checksum());

            Ok(())
        }
        Commands::Inspect { input } => {
            println!("Parsing binary file: {}", input.display());

            match hub_profile_tool::inspect_image_file(&input)? {
                Some(profile) => {
                    println!("Valid profile record, checksum 0x{:02X}", profile.checksum());
                    println!("{}", hex::encode(profile.as_bytes()));
                }
                None => println!("No valid profile record, the hub uses the all-zero default"),
            }

            Ok(())
        }
        Commands::Packet { kind } => {
            let packet = match kind {
                PacketCommands::Push { payload } => {
                    let profile = hub_profile_tool::parse_payload(&payload)?;
                    hub_profile_tool::push_packet(&profile)
                }
                PacketCommands::Read => hub_profile_tool::read_packet(),
            };
            println!("{}", hex::encode(packet.as_bytes()));

            Ok(())
        }
    }
}
