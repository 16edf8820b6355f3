use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fnote_capitaliser_core::{
    app_paths, apply_plan, generate_plan, load_config, plan_single_file, rename_candidate,
    save_config, to_sentence_case, to_title_case, undo_last, watch_root, ApplyResult, CasingMode,
    PlanOptions, RenamePlan, WatchOptions,
};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "fnote-capitaliser-cli")]
#[command(about = "Markdownノートのファイル名を大文字小文字変換で一括リネームします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Single(SingleArgs),
    Watch(WatchArgs),
    Preview(PreviewArgs),
    Undo,
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(long)]
    input: String,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct SingleArgs {
    path: String,
    #[arg(long, value_enum, default_value_t = ModeArg::Title)]
    mode: ModeArg,
    #[arg(long, default_value_t = false)]
    apply: bool,
}

#[derive(Debug, Args)]
struct WatchArgs {
    #[arg(long)]
    input: String,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long)]
    delay_ms: Option<u64>,
    #[arg(long, default_value_t = false)]
    recursive: bool,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    #[arg(default_value = "an example_file-name")]
    sample: String,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    SetMode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    SetDelay {
        delay_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Sentence,
    Title,
}

impl From<ModeArg> for CasingMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Sentence => CasingMode::Sentence,
            ModeArg::Title => CasingMode::Title,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Single(args) => cmd_single(args),
        Commands::Watch(args) => cmd_watch(args),
        Commands::Preview(args) => cmd_preview(args),
        Commands::Undo => cmd_undo(),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::SetMode { mode } => cmd_config_set_mode(mode),
            ConfigAction::SetDelay { delay_ms } => cmd_config_set_delay(delay_ms),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let mode = match args.mode {
        Some(mode) => mode.into(),
        None => load_config()?.capitalisation_mode,
    };

    let options = PlanOptions {
        input: args.input.into(),
        mode,
        recursive: args.recursive,
        include_hidden: args.include_hidden,
    };

    let plan = generate_plan(&options)?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Table => {
            print_table(&plan);
        }
    }

    if args.apply {
        let result = apply_plan(&plan)?;
        report_apply(&result);
    } else {
        eprintln!("dry-runモード: 実ファイルは変更していません。適用するには --apply を指定してください。");
    }

    Ok(())
}

fn cmd_single(args: SingleArgs) -> Result<()> {
    let candidate = plan_single_file(args.path.as_ref(), args.mode.into())?;

    if !candidate.changed {
        eprintln!("変更不要です: {}", candidate.original_path.display());
        return Ok(());
    }

    println!(
        "{} -> {}",
        candidate.original_path.display(),
        candidate.target_path.display()
    );

    if args.apply {
        rename_candidate(&candidate)?;
        eprintln!("リネームしました。");
    } else {
        eprintln!("dry-runモード: 適用するには --apply を指定してください。");
    }

    Ok(())
}

fn cmd_watch(args: WatchArgs) -> Result<()> {
    let config = load_config()?;
    let options = WatchOptions {
        root: args.input.into(),
        mode: args
            .mode
            .map(Into::into)
            .unwrap_or(config.capitalisation_mode),
        delay: Duration::from_millis(args.delay_ms.unwrap_or(config.delay_ms)),
        recursive: args.recursive,
    };

    watch_root(&options)?;
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> Result<()> {
    println!("入力: \"{}\"", args.sample);
    println!("sentence: \"{}\"", to_sentence_case(&args.sample));
    println!("title:    \"{}\"", to_title_case(&args.sample));
    Ok(())
}

fn cmd_undo() -> Result<()> {
    let result = undo_last()?;
    println!("取り消し完了: {}件", result.restored);
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_set_mode(mode: ModeArg) -> Result<()> {
    let mut config = load_config()?;
    config.capitalisation_mode = mode.into();
    save_config(&config)?;
    println!("capitalisation_mode を更新しました: {:?}", config.capitalisation_mode);
    Ok(())
}

fn cmd_config_set_delay(delay_ms: u64) -> Result<()> {
    let mut config = load_config()?;
    config.delay_ms = delay_ms;
    save_config(&config)?;
    println!("delay_ms を更新しました: {}", config.delay_ms);
    Ok(())
}

fn report_apply(result: &ApplyResult) {
    eprintln!(
        "適用完了: {}件 (変更なし {}件, 失敗 {}件)",
        result.applied,
        result.unchanged,
        result.failures.len()
    );
    for failure in &result.failures {
        eprintln!(
            "  失敗: {} -> {} ({})",
            failure.original_path.display(),
            failure.target_path.display(),
            failure.message
        );
    }
}

fn print_table(plan: &RenamePlan) {
    println!("元ファイル -> 新ファイル");
    for candidate in &plan.candidates {
        let marker = if candidate.changed { "" } else { " (変更なし)" };
        println!(
            "{} -> {}{}",
            candidate.original_path.display(),
            candidate.target_path.display(),
            marker
        );
    }

    println!(
        "\n集計: scanned={} markdown={} non_md_skip={} hidden_skip={} planned={} unchanged={}",
        plan.stats.scanned_files,
        plan.stats.markdown_files,
        plan.stats.skipped_non_markdown,
        plan.stats.skipped_hidden,
        plan.stats.planned,
        plan.stats.unchanged
    );
}
