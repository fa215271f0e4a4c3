use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use tagmap_worker::replay::{ReplayConfig, replay_tagmap};
use tagmap_worker::tagmap::RawTagMapQuery;

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_args()?;
    let response = replay_tagmap(&config).await?;
    let rendered =
        serde_json::to_string_pretty(&response).context("failed to render response JSON")?;
    println!("{rendered}");
    Ok(())
}

fn parse_args() -> Result<ReplayConfig> {
    let mut dataset = None;
    let mut query = RawTagMapQuery::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                let value = args.next().context("--dataset requires a path argument")?;
                dataset = Some(PathBuf::from(value));
            }
            "--view" => {
                query.view = Some(args.next().context("--view requires a value")?);
            }
            "--consolidation" => {
                let value = args
                    .next()
                    .context("--consolidation requires a value between 0 and 1")?;
                value
                    .parse::<f64>()
                    .context("--consolidation must be a number")?;
                query.consolidation = Some(value);
            }
            "--namespace" => {
                query.namespace = Some(args.next().context("--namespace requires a value")?);
            }
            "--status" => {
                query.status_filter = Some(
                    args.next()
                        .context("--status requires ranked, unranked or all")?,
                );
            }
            "--custom" => {
                query.custom_tagset = Some(args.next().context("--custom requires tokens")?);
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                bail!("unknown argument: {}", arg);
            }
        }
    }

    let dataset = dataset.ok_or_else(|| anyhow!("--dataset is required"))?;
    Ok(ReplayConfig { dataset, query })
}

fn print_usage() {
    eprintln!(
        "Usage: replay_tagmap --dataset <path> [--view tagsets|single|overlap|custom] [--consolidation 0.1] [--namespace osu] [--status ranked|unranked|all] [--custom \"<tokens>\"]"
    );
}
