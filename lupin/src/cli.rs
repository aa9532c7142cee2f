use crate::config::{ViewerConfig, DEFAULT_PAGE_SIZE};
use crate::payload::RenderPayload;
use crate::ranking::{rank_genes, RankQuery, Sign};
use crate::render::render_text;
use crate::session::{TopicViewer, ViewerEvent};
use clap::Args;
use log::{info, warn};
use std::io::{BufRead, Write};
use std::sync::Arc;
use topic_beans::common_io::open_buf_writer;
use topic_beans::loader::{load_data_store, TableFiles};
use topic_beans::{DataStore, TableKind};

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    #[arg(
        long,
        required = true,
        help = "Topic proportions (rows: <tissue>_<timepoint>_<replicate>, columns: topics)"
    )]
    pub topics: Box<str>,

    #[arg(
        long,
        required = true,
        help = "Expression, e.g. CPM (rows: genes, columns: <tissue>_<timepoint>_<replicate>)"
    )]
    pub counts: Box<str>,

    #[arg(
        long,
        requires = "tissue_z",
        conflicts_with = "beta",
        help = "Dataset-wide Z-scores (rows: genes, columns: topics)"
    )]
    pub global_z: Option<Box<str>>,

    #[arg(
        long,
        requires = "global_z",
        conflicts_with = "beta",
        help = "Intra-tissue Z-scores (columns: gene, tissue, topics...)"
    )]
    pub tissue_z: Option<Box<str>>,

    #[arg(long, help = "Beta coefficients (rows: genes, columns: topics)")]
    pub beta: Option<Box<str>>,

    #[arg(long, help = "Counts are already normalized; skip per-gene min-max scaling")]
    pub no_normalize: bool,

    #[arg(short = 'v', long, help = "Verbose output")]
    pub verbose: bool,
}

impl TableArgs {
    pub fn table_files(&self) -> TableFiles {
        TableFiles {
            topics: self.topics.clone(),
            counts: self.counts.clone(),
            global_z: self.global_z.clone(),
            tissue_z: self.tissue_z.clone(),
            beta: self.beta.clone(),
            normalize: !self.no_normalize,
        }
    }
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    #[command(flatten)]
    pub tables: TableArgs,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, help = "Genes per page")]
    pub page_size: usize,

    #[arg(long, help = "Print each page as a JSON line instead of a table")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    #[command(flatten)]
    pub tables: TableArgs,

    #[arg(short = 't', long, required = true, help = "Topic")]
    pub topic: Box<str>,

    #[arg(
        short = 'k',
        long,
        default_value = "global",
        help = "Statistic: global, intra (needs --tissue) or beta"
    )]
    pub kind: TableKind,

    #[arg(long, help = "Tissue for intra-tissue statistics")]
    pub tissue: Option<Box<str>>,

    #[arg(short = 's', long, default_value = "pos", help = "Sign: pos or neg")]
    pub sign: Sign,

    #[arg(short = 'o', long, default_value = "stdout", help = "Output file (.tsv or .tsv.gz)")]
    pub out: Box<str>,
}

/// One line typed in the terminal session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Event(ViewerEvent),
    Show,
    Help,
    Quit,
}

pub const SESSION_HELP: &str = "\
commands: t <topic> | k <global|intra|beta> | x <tissue> | s <pos|neg> | n | p | r(eset) | h(elp) | q(uit)";

pub fn parse_command(line: &str) -> anyhow::Result<SessionCommand> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(SessionCommand::Show);
    };
    let arg = words.next();

    let need = |what: &str| anyhow::anyhow!("`{}` needs a {}", cmd, what);

    let event = match cmd.to_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(SessionCommand::Quit),
        "h" | "help" | "?" => return Ok(SessionCommand::Help),
        "t" | "topic" => ViewerEvent::TopicClick(arg.ok_or_else(|| need("topic"))?.into()),
        "k" | "kind" => ViewerEvent::TableKindChange(arg.ok_or_else(|| need("table kind"))?.parse()?),
        "x" | "tissue" => ViewerEvent::TissueChange(arg.ok_or_else(|| need("tissue"))?.into()),
        "s" | "sign" => ViewerEvent::SignChange(arg.ok_or_else(|| need("sign"))?.parse()?),
        "n" | "next" => ViewerEvent::PageForward,
        "p" | "prev" => ViewerEvent::PageBackward,
        "r" | "reset" => ViewerEvent::Reset,
        _ => return Err(anyhow::anyhow!("unknown command `{}`", cmd)),
    };
    Ok(SessionCommand::Event(event))
}

fn load_store(args: &TableArgs) -> anyhow::Result<Arc<DataStore>> {
    Ok(Arc::new(load_data_store(&args.table_files())?))
}

fn print_payload<W: Write>(output: &mut W, payload: &RenderPayload, json: bool) -> anyhow::Result<()> {
    if json {
        writeln!(output, "{}", serde_json::to_string(payload)?)?;
    } else {
        writeln!(output, "{}", render_text(payload))?;
    }
    Ok(())
}

fn print_result<W: Write>(
    output: &mut W,
    result: topic_beans::Result<RenderPayload>,
    json: bool,
) -> anyhow::Result<()> {
    match result {
        Ok(payload) => print_payload(output, &payload, json)?,
        Err(e) => writeln!(output, "error: {}", e)?,
    }
    output.flush()?;
    Ok(())
}

///
/// Drive a viewer from command lines on `input`, printing a payload
/// after every command. Bad commands and failed transitions are
/// reported and the session carries on in its previous state.
///
pub fn run_session<R, W>(
    viewer: &mut TopicViewer,
    input: R,
    output: &mut W,
    json: bool,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    print_result(output, viewer.render(), json)?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::Help => writeln!(output, "{}", SESSION_HELP)?,
            SessionCommand::Show => print_result(output, viewer.render(), json)?,
            SessionCommand::Event(event) => {
                let result = viewer.handle(&event);
                if let Err(e) = &result {
                    warn!("{:?} failed: {}", event, e);
                }
                print_result(output, result, json)?;
            }
        }
    }
    Ok(())
}

pub fn view_topics(args: &ViewArgs) -> anyhow::Result<()> {
    let store = load_store(&args.tables)?;
    let config = ViewerConfig::new(args.page_size)?;
    let mut viewer = TopicViewer::new(store, config)?;

    info!("Session started; {}", SESSION_HELP);
    if !args.json {
        eprintln!("{}", SESSION_HELP);
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    run_session(&mut viewer, stdin.lock(), &mut stdout, args.json)
}

pub fn rank_topic_genes(args: &RankArgs) -> anyhow::Result<()> {
    let store = load_store(&args.tables)?;

    let query = RankQuery {
        topic: args.topic.clone(),
        kind: args.kind,
        tissue: args.tissue.clone(),
        sign: args.sign,
    };
    let ranked = rank_genes(&store, &query)?;

    let mut w = open_buf_writer(&args.out)?;
    writeln!(w, "rank\tgene\t{}", args.kind)?;
    for (r, row) in ranked.iter().enumerate() {
        writeln!(w, "{}\t{}\t{}", r, row.gene, row.value)?;
    }
    w.flush()?;

    info!(
        "Wrote {} {} genes of topic {} to {}",
        ranked.len(),
        args.sign,
        args.topic,
        args.out
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_commands() -> anyhow::Result<()> {
        assert_eq!(parse_command("  ")?, SessionCommand::Show);
        assert_eq!(parse_command("q")?, SessionCommand::Quit);
        assert_eq!(
            parse_command("t k3")?,
            SessionCommand::Event(ViewerEvent::TopicClick("k3".into()))
        );
        assert_eq!(
            parse_command("k intra")?,
            SessionCommand::Event(ViewerEvent::TableKindChange(TableKind::IntraTissue))
        );
        assert_eq!(
            parse_command("s neg")?,
            SessionCommand::Event(ViewerEvent::SignChange(Sign::Negative))
        );
        assert_eq!(
            parse_command("n")?,
            SessionCommand::Event(ViewerEvent::PageForward)
        );
        Ok(())
    }

    #[test]
    fn malformed_commands() {
        assert!(parse_command("t").is_err());
        assert!(parse_command("k pca").is_err());
        assert!(parse_command("jump 3").is_err());
    }
}
