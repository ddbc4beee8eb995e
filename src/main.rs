use std::process;
use std::sync::Arc;
use std::time::Duration;

use folio::{
    application::{
        blocks::BlockDispatcher,
        error::AppError,
        page::PageService,
        richtext::RichTextRenderer,
        sources::{PageSource, SubmissionGateway},
        submission::SubmissionService,
    },
    config,
    infra::{
        cms::CmsClient,
        error::InfraError,
        http::{self, HttpState},
        richtext::HtmlRichTextRenderer,
        telemetry,
    },
};
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cms = Arc::new(CmsClient::new(&settings.cms)?);
    let gateway: Arc<dyn SubmissionGateway> = cms.clone();
    let source: Arc<dyn PageSource> = cms;

    let submissions = Arc::new(SubmissionService::new(
        gateway,
        settings.submission.reset_delay,
    ));
    let richtext: Arc<dyn RichTextRenderer> = Arc::new(HtmlRichTextRenderer::new());
    let blocks = Arc::new(BlockDispatcher::new(richtext, submissions.clone()));
    let pages = Arc::new(PageService::new(source, blocks.clone()));

    let state = HttpState {
        pages,
        submissions,
        blocks,
        landing_slug: settings.cms.landing_slug.clone(),
    };
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    info!(
        target: "folio::serve",
        addr = %settings.server.addr,
        landing_slug = %settings.cms.landing_slug,
        cms = %settings.cms.base_url,
        "listening"
    );

    spawn_shutdown_watchdog(settings.server.graceful_shutdown);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    info!(target: "folio::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(target: "folio::serve", "shutdown signal received, draining connections"),
        Err(err) => {
            error!(target: "folio::serve", error = %err, "failed to listen for shutdown signal");
        }
    }
}

/// Hard stop if draining exceeds the configured grace window.
fn spawn_shutdown_watchdog(grace: Duration) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tokio::time::sleep(grace).await;
        warn!(
            target: "folio::serve",
            grace_seconds = grace.as_secs(),
            "graceful shutdown window elapsed, exiting"
        );
        process::exit(0);
    });
}
