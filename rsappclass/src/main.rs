//! rsappclass 命令行
//! 日志输出到 stderr，stdout 只输出结果

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use rsappclass::{
    build_refiner, Classifier, ClassifierConfig, GitSourceFetcher, HealthStatus, IngestPipeline, LabelRefiner,
    RefineConfig, RsAppError, RsAppResult, SourcesConfig, TelemetryRecord,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

/// 基于规则的 HTTP 遥测应用分类器
#[derive(Parser, Debug)]
#[command(name = "rsappclass", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 拉取规则源并生成合并规则文件
    Ingest {
        /// 缓存根目录
        #[arg(long, env = "RULES_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
        /// 每个规则源的最大规则数
        #[arg(long, env = "MAX_RULES")]
        max_rules: Option<usize>,
        /// 以 JSON 输出采集报告
        #[arg(long)]
        json: bool,
    },
    /// 分类遥测记录（JSON 数组或单个对象）
    Classify {
        /// 规则文件
        #[arg(long, env = "RULES_PATH")]
        rules: Option<PathBuf>,
        /// 输入文件，"-" 表示标准输入
        #[arg(long, default_value = "-")]
        input: String,
    },
    /// 输出健康状态
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> RsAppResult<()> {
    match command {
        Command::Ingest {
            cache_dir,
            max_rules,
            json,
        } => {
            let mut config = SourcesConfig::from_env();
            if let Some(dir) = cache_dir {
                config.cache_dir = dir;
            }
            if let Some(max) = max_rules {
                config.max_rules = max;
            }

            let fetcher = GitSourceFetcher::from_config(&config);
            let report = IngestPipeline::new(config, fetcher).run().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Command::Classify { rules, input } => {
            let mut config = ClassifierConfig::from_env();
            if let Some(path) = rules {
                config = config.with_rules_path(path);
            }
            let classifier = Classifier::from_config(config, &RefineConfig::from_env())?;

            let records = parse_records(&read_input(&input).await?)?;
            log::info!("Classifying {} records", records.len());
            let response = classifier.classify_batch(records).await;
            println!("{}", serde_json::to_string(&response)?);
        }
        Command::Health => {
            let use_llm = build_refiner(&RefineConfig::from_env())
                .map(|refiner| refiner.is_enabled())
                .unwrap_or_else(|e| {
                    log::warn!("{}", e);
                    false
                });
            println!("{}", serde_json::to_string(&HealthStatus { ok: true, use_llm })?);
        }
    }
    Ok(())
}

async fn read_input(input: &str) -> RsAppResult<String> {
    if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        Ok(tokio::fs::read_to_string(input).await?)
    }
}

fn parse_records(text: &str) -> RsAppResult<Vec<TelemetryRecord>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(RsAppError::from))
            .collect(),
        object @ Value::Object(_) => Ok(vec![serde_json::from_value(object)?]),
        other => Err(RsAppError::InvalidInput(format!(
            "输入必须是 JSON 对象或数组，实际为: {}",
            other
        ))),
    }
}
