//! 트레이딩 봇 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 과거 1분봉 수집
//! quant fetch -s btcusdt -f "2024-04-05 20:32:00"
//!
//! # KDJ 지표 사전 계산 (1분/5분)
//! quant kdj -s btcusdt -i 1 -i 5
//!
//! # 백테스트
//! quant backtest -s btcusdt -f "2024-04-05 20:32:00" -c strategy_config.json
//!
//! # 실거래 (API_KEY / SECRET_KEY 환경 변수 필요)
//! quant trade -s btcusdt -c config/optimal_config.json
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{backtest, fetch, kdj, trade};
use config::AppConfig;

#[derive(Parser)]
#[command(name = "quant")]
#[command(about = "분봉 규칙 전략 백테스트/실거래 봇", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 과거 캔들 수집 (Binance 선물)
    Fetch {
        /// 심볼 (예: btcusdt)
        #[arg(short, long, default_value = "btcusdt")]
        symbol: String,

        /// 시작 시각 (YYYY-MM-DD HH:MM:SS, 설정 타임존 기준)
        #[arg(short = 'f', long)]
        start_time: String,

        /// 종료 시각 (기본: 1분 전)
        #[arg(short = 't', long)]
        end_time: Option<String>,

        /// 캔들 간격 (분)
        #[arg(short, long, default_value = "1")]
        interval: u32,
    },

    /// KDJ 지표 사전 계산
    Kdj {
        /// 심볼
        #[arg(short, long, default_value = "btcusdt")]
        symbol: String,

        /// 계산할 간격 목록 (분)
        #[arg(short, long, default_values_t = vec![1u32])]
        interval: Vec<u32>,
    },

    /// 백테스트 실행
    Backtest {
        /// 심볼
        #[arg(short, long, default_value = "btcusdt")]
        symbol: String,

        /// 시작 시각
        #[arg(short = 'f', long, default_value = "2024-04-05 20:32:00")]
        start_time: String,

        /// 종료 시각 (기본: 저장소 마지막 캔들)
        #[arg(short = 't', long)]
        end_time: Option<String>,

        /// 전략 설정 파일 경로
        #[arg(short = 'c', long, default_value = "strategy_config.json")]
        strategy_config_path: String,

        /// 실행 전에 캔들을 새로 수집
        #[arg(long, default_value = "false")]
        fetch_price: bool,
    },

    /// 실거래 실행
    Trade {
        /// 심볼
        #[arg(short, long, default_value = "btcusdt")]
        symbol: String,

        /// 전략 설정 파일 경로
        #[arg(short = 'c', long, default_value = "config/optimal_config.json")]
        strategy_config_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::from_env()?;

    match cli.command {
        Commands::Fetch {
            symbol,
            start_time,
            end_time,
            interval,
        } => fetch::run(&app_config, &symbol, &start_time, end_time.as_deref(), interval).await,
        Commands::Kdj { symbol, interval } => kdj::run(&app_config, &symbol, &interval),
        Commands::Backtest {
            symbol,
            start_time,
            end_time,
            strategy_config_path,
            fetch_price,
        } => {
            backtest::run(
                &app_config,
                &symbol,
                &start_time,
                end_time.as_deref(),
                &strategy_config_path,
                fetch_price,
            )
            .await
        }
        Commands::Trade {
            symbol,
            strategy_config_path,
        } => trade::run(&app_config, &symbol, &strategy_config_path).await,
    }
}
