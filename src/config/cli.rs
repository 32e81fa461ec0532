use crate::config::toml_config::TriageConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "ticket-triage")]
#[command(about = "Support ticket classifier API")]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override server.host from config
    #[arg(long)]
    pub host: Option<String>,

    /// Override server.port from config
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ServerArgs {
    /// 命令列參數覆蓋設定檔
    pub fn apply(&self, config: &mut TriageConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}
