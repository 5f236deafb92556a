use std::env;
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use content_pipeline::{
    app::ComponentRegistry,
    config::Config,
    pipeline::{ContentRequest, TransitionTable},
};

enum Command {
    Graph,
    Generate(ContentRequest),
}

#[tokio::main]
async fn main() -> Result<()> {
    match parse_args()? {
        Command::Graph => {
            print!("{}", TransitionTable::content_pipeline().to_mermaid());
            Ok(())
        }
        Command::Generate(request) => {
            let config = Config::from_env().context("failed to load configuration")?;
            let registry =
                ComponentRegistry::build(&config).context("failed to build component registry")?;
            let outcome = registry.pipeline().run(request).await?;
            let rendered =
                serde_json::to_string_pretty(&outcome).context("failed to render outcome")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

fn parse_args() -> Result<Command> {
    let mut content_type = None;
    let mut topic = None;
    let mut graph = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--content-type" => {
                let value = args
                    .next()
                    .context("--content-type requires blog_post, tweet or linkedin_post")?;
                content_type = Some(value);
            }
            "--topic" => {
                let value = args.next().context("--topic requires a text argument")?;
                topic = Some(value);
            }
            "--graph" => {
                graph = true;
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

    if graph {
        return Ok(Command::Graph);
    }

    let content_type = content_type.ok_or_else(|| anyhow!("--content-type is required"))?;
    let topic = topic.ok_or_else(|| anyhow!("--topic is required"))?;
    Ok(Command::Generate(ContentRequest::new(content_type, topic)))
}

fn print_usage() {
    eprintln!(
        "Usage: generate_once --content-type <blog_post|tweet|linkedin_post> --topic <text> [--graph]"
    );
}
