// ==========================================
// 赛事报名管理系统 - 命令行主入口
// ==========================================
// 技术栈: clap + tokio + SQLite
// 用途: 读取分隔文本文件,探测布局,执行批量导入并打印汇总
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use race_registration::config::ConfigManager;
use race_registration::i18n::t;
use race_registration::{
    db, i18n, logging, CanonicalField, EntryImporter, EntryImporterImpl, FieldMapper,
    FormatDetector, ImportKind, ImportOptions, ImportTarget, LogProgress,
    SqliteAthleteRepository, SqliteCategoryRecalc, TableParser,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(
    name = "race-registration",
    version,
    about = "赛事报名管理系统 - 成绩/历史报名批量导入"
)]
struct Cli {
    /// 数据库文件路径(默认: 数据目录下 race-registration/race.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 界面语言(zh-CN / en)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入成绩或历史报名文件
    Import {
        /// 源文件(UTF-8 分隔文本,.csv/.txt)
        #[arg(long)]
        file: PathBuf,

        /// 目标赛事标识
        #[arg(long)]
        event_id: String,

        /// 目标比赛标识
        #[arg(long)]
        race_id: String,

        /// 导入流程种类
        #[arg(long, value_enum, default_value_t = KindArg::Results)]
        kind: KindArg,

        /// 历史报名: 缴费金额列名
        #[arg(long)]
        amount_column: Option<String>,

        /// 历史报名: 备注列名(可重复,原文拼接进备注)
        #[arg(long = "note-column")]
        note_columns: Vec<String>,

        /// 手工映射覆写,格式 field=列名(可重复,如 --map first_name=Prénom)
        #[arg(long = "map", value_parser = parse_map_override)]
        map_overrides: Vec<(String, String)>,

        /// 以 JSON 输出批次结果(供脚本消费)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// 外部计时系统成绩
    Results,
    /// 历史报名
    Legacy,
}

fn parse_map_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, column)| (field.trim().to_string(), column.trim().to_string()))
        .ok_or_else(|| format!("映射覆写格式应为 field=列名: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    if let Some(locale) = &cli.locale {
        i18n::set_locale(locale);
    }

    tracing::info!("==================================================");
    tracing::info!("{} - 导入工具", race_registration::APP_NAME);
    tracing::info!("系统版本: {}", race_registration::VERSION);
    tracing::info!("==================================================");

    // 打开数据库并确保表结构
    let db_path = cli.db.clone().unwrap_or_else(db::default_db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据目录: {}", parent.display()))?;
    }
    let db_str = db_path.to_string_lossy().to_string();
    tracing::info!("使用数据库: {}", db_str);

    let conn = db::open_sqlite_connection(&db_str)
        .with_context(|| format!("无法打开数据库: {}", db_str))?;
    db::initialize_schema(&conn).context("表结构初始化失败")?;
    let shared = Arc::new(Mutex::new(conn));

    match cli.command {
        Commands::Import {
            file,
            event_id,
            race_id,
            kind,
            amount_column,
            note_columns,
            map_overrides,
            json,
        } => {
            run_import(
                shared,
                &file,
                event_id,
                race_id,
                kind,
                amount_column,
                note_columns,
                map_overrides,
                json,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_import(
    shared: Arc<Mutex<rusqlite::Connection>>,
    file: &PathBuf,
    event_id: String,
    race_id: String,
    kind: KindArg,
    amount_column: Option<String>,
    note_columns: Vec<String>,
    map_overrides: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("无法读取文件: {}", file.display()))?;

    // 组装导入管道
    let repo = SqliteAthleteRepository::from_connection(shared.clone())?;
    let config = ConfigManager::from_connection(shared.clone())?;
    let recalc = SqliteCategoryRecalc::from_connection(shared.clone())?;
    let importer = EntryImporterImpl::new(repo, config, Box::new(recalc), Box::new(LogProgress));

    // 探测布局,构建映射(预置/自动 + 手工覆写)
    let detected = FormatDetector.detect(&text);
    let table = TableParser.parse(&text, &detected.layout)?;
    let mut mapping = detected
        .preset_mapping
        .unwrap_or_else(|| FieldMapper.auto_map(&table.headers));

    for (field_name, column) in &map_overrides {
        let Some(field) = CanonicalField::from_name(field_name) else {
            bail!("未知规范字段: {}", field_name);
        };
        mapping.set(field, column)?;
    }

    let options = ImportOptions {
        kind: Some(match kind {
            KindArg::Results => ImportKind::TimingResults,
            KindArg::Legacy => ImportKind::LegacyRegistration,
        }),
        source_label: file
            .file_name()
            .map(|name| name.to_string_lossy().to_string()),
        amount_column,
        note_columns,
        cancel_flag: None,
    };
    let target = ImportTarget { event_id, race_id };

    let outcome = importer
        .import_table(&table, &mapping, &target, &options)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    // 运营汇总: 计数器 + 前几条错误
    let preview_config = ConfigManager::from_connection(shared)?;
    let preview_limit = {
        use race_registration::config::ImportConfigReader;
        preview_config.get_error_preview_limit().await?
    };

    println!(
        "{}: {} {} / {} {} / {} {}",
        t("import.summary"),
        t("import.imported"),
        outcome.imported,
        t("import.skipped"),
        outcome.skipped_duplicates,
        t("import.errors"),
        outcome.error_count()
    );
    if outcome.errors.is_empty() {
        println!("{}", t("import.no_errors"));
    } else {
        println!("{}:", t("import.error_preview"));
        for err in outcome.errors.iter().take(preview_limit) {
            println!("  - {}: {}", err.row_label, err.message);
        }
    }

    Ok(())
}
