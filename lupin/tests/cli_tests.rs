use lupin::cli::{rank_topic_genes, RankArgs, TableArgs};
use lupin::ranking::Sign;
use lupin::TableKind;
use std::io::{BufRead, Write};
use topic_beans::common_io::{open_buf_reader, open_buf_writer};

fn write_file(dir: &std::path::Path, name: &str, lines: &[&str]) -> anyhow::Result<Box<str>> {
    let path = dir.join(name);
    let path = path.to_str().ok_or(anyhow::anyhow!("path"))?.to_owned();
    let mut w = open_buf_writer(&path)?;
    for l in lines {
        writeln!(w, "{}", l)?;
    }
    w.flush()?;
    Ok(path.into_boxed_str())
}

fn beta_tables(dir: &std::path::Path) -> anyhow::Result<TableArgs> {
    Ok(TableArgs {
        topics: write_file(
            dir,
            "topics.csv",
            &[",k1,k2", "lung_t0_a,0.3,0.7", "lung_t1_a,0.6,0.4"],
        )?,
        counts: write_file(
            dir,
            "cpm.csv",
            &["gene,lung_t0_a,lung_t1_a", "Ifng,1,2", "Gzmb,3,1", "Cd3e,2,2", "Nkg7,0,5"],
        )?,
        global_z: None,
        tissue_z: None,
        beta: Some(write_file(
            dir,
            "beta.csv.gz",
            &["gene,k1,k2", "Ifng,0.5,-1", "Gzmb,-0.5,2", "Cd3e,0,0.1", "Nkg7,0.5,-3"],
        )?),
        no_normalize: false,
        verbose: false,
    })
}

#[test]
fn rank_writes_the_whole_ranking() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tables = beta_tables(dir.path())?;
    let out = dir.path().join("k1_pos.tsv.gz");
    let out: Box<str> = out.to_str().ok_or(anyhow::anyhow!("path"))?.into();

    let args = RankArgs {
        tables,
        topic: "k1".into(),
        kind: TableKind::Beta,
        tissue: None,
        sign: Sign::Positive,
        out: out.clone(),
    };
    rank_topic_genes(&args)?;

    let lines: Vec<String> = open_buf_reader(&out)?.lines().collect::<Result<_, _>>()?;
    assert_eq!(
        lines,
        vec!["rank\tgene\tbeta", "0\tIfng\t0.5", "1\tNkg7\t0.5"]
    );
    Ok(())
}

#[test]
fn rank_rejects_a_table_that_is_not_loaded() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let args = RankArgs {
        tables: beta_tables(dir.path())?,
        topic: "k2".into(),
        kind: TableKind::Global,
        tissue: None,
        sign: Sign::Negative,
        out: "stdout".into(),
    };
    assert!(rank_topic_genes(&args).is_err());
    Ok(())
}
