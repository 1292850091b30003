//! 领事服务客户端命令行入口
//! 用于排查会话与权限问题的轻量工具

use anyhow::Context;
use consular_client::{
    api::ApiClient,
    auth::{policy, FileStorage, SessionStore},
    config::ClientConfig,
    services::{guard, AuthService, RouteDecision, SessionState, StatsService},
    telemetry,
};
use std::sync::Arc;

/// 登录密码来源（避免出现在命令行历史中）
const PASSWORD_ENV: &str = "CONSULAR_PASSWORD";

enum Command {
    Status,
    Login { email: String },
    Logout,
    CanAccess { path: String },
    Dashboard,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    let command = match args.get(1).map(String::as_str) {
        Some("--version") => {
            println!("consular-client {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") | None => {
            print_help();
            return Ok(());
        }
        Some("status") => Command::Status,
        Some("logout") => Command::Logout,
        Some("dashboard") => Command::Dashboard,
        Some("login") => match args.get(2) {
            Some(email) => Command::Login {
                email: email.clone(),
            },
            None => usage_error("login 需要邮箱参数"),
        },
        Some("can-access") => match args.get(2) {
            Some(path) => Command::CanAccess { path: path.clone() },
            None => usage_error("can-access 需要路径参数"),
        },
        Some(other) => usage_error(&format!("未知参数: {}", other)),
    };

    // 加载 .env 文件（开发环境）
    if let Ok(env) = std::env::var("CONSULAR_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = ClientConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    // 3. 会话与网关
    let session = SessionStore::new(
        Arc::new(FileStorage::new(&config.storage.dir)),
        config.storage.key.clone(),
    );
    let api = Arc::new(ApiClient::from_config(&config, session.clone())?);
    let auth = AuthService::new(api.clone());

    match command {
        Command::Status => {
            let state = auth.restore().await;
            print_state(&state);
        }
        Command::Login { email } => {
            let password = std::env::var(PASSWORD_ENV)
                .with_context(|| format!("{} is not set", PASSWORD_ENV))?;
            let outcome = auth.login(&email, &password).await?;
            println!(
                "已登录: {} ({})",
                outcome.user.email,
                policy::role_display_name(Some(outcome.user.role))
            );
            println!("落地页: {}", outcome.landing_route);
        }
        Command::Logout => {
            if auth.logout() {
                println!("已登出");
            } else {
                println!("当前没有会话");
            }
        }
        Command::CanAccess { path } => {
            auth.restore().await;
            match guard(&session.snapshot(), &path) {
                RouteDecision::Allow => println!("允许: {}", path),
                RouteDecision::Redirect(target) => println!("重定向: {} -> {}", path, target),
            }
        }
        Command::Dashboard => {
            let state = auth.restore().await;
            let role = state.user().map(|u| u.role);
            let today = chrono::Local::now().date_naive();
            let dashboard = StatsService::new(api.clone())
                .admin_dashboard(role, today)
                .await?;

            let a = &dashboard.appointments;
            println!(
                "预约: 总数 {} / 待处理 {} / 已确认 {} / 今天 {} / 本月 {}",
                a.total, a.pending, a.confirmed, a.today, a.this_month
            );
            let p = &dashboard.applications;
            println!(
                "申请: 总数 {} / 已提交 {} / 审核中 {} / 处理中 {} / 可领取 {} / 本月 {}",
                p.total, p.submitted, p.under_review, p.processing, p.ready, p.this_month
            );
        }
    }

    Ok(())
}

fn print_state(state: &SessionState) {
    match state {
        SessionState::Authenticated(user) => {
            println!("已登录: {} <{}>", user.full_name(), user.email);
            println!("角色: {}", policy::role_display_name(Some(user.role)));
            println!("落地页: {}", policy::default_route(Some(user.role)));
        }
        SessionState::Unauthenticated => println!("未登录"),
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    print_help();
    std::process::exit(1);
}

/// 打印帮助信息
fn print_help() {
    println!("consular-client {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: consular-client <命令>");
    println!();
    println!("命令:");
    println!("  status              恢复并显示当前会话");
    println!("  login <email>       登录（密码取自 {}）", PASSWORD_ENV);
    println!("  logout              清除本地会话");
    println!("  can-access <path>   检查当前会话能否进入某个页面");
    println!("  dashboard           管理员统计");
    println!("  --version           打印版本信息并退出");
    println!("  --help              打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  配置使用 CONSULAR_ 前缀，例如 CONSULAR_API__BASE_URL");
}
