use clap::{Parser, Subcommand};
use lupin::cli::*;
use log::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LUPIN",
    long_about = "Look Up ranked genes Per topIc aNd tissue\n\
		  Browse topic models of a multi-tissue timecourse:\n\
		  pick a topic, a statistic (global or intra-tissue Z, or beta)\n\
		  and a sign to page through its strongest genes."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Interactive session over topic rankings",
        long_about = "Read commands from stdin and print a page after each one:\n\
		      t <topic>, k <global|intra|beta>, x <tissue>, s <pos|neg>,\n\
		      n (next page), p (previous page), r (reset), q (quit).\n"
    )]
    View(ViewArgs),

    #[command(
        about = "Write one complete ranking",
        long_about = "Rank the genes of a topic by one statistic and sign\n\
		      and write `rank gene value` lines.\n"
    )]
    Rank(RankArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.commands {
        Commands::View(args) => args.tables.verbose,
        Commands::Rank(args) => args.tables.verbose,
    };
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::View(args) => {
            view_topics(args)?;
        }
        Commands::Rank(args) => {
            rank_topic_genes(args)?;
        }
    }

    info!("Done");
    Ok(())
}
