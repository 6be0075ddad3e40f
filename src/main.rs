use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{BufReader, Stdin};
use tracing::info;
use voice_avatar::capability::{FrameSource, SilenceSource, WavFileSource};
use voice_avatar::{
    create_router, spawn_presenter, AppState, BufferedPlayer, Capabilities, Config,
    ConsoleSynthesizer, ControllerHandle, HttpReplyClient, LineRecognizer, Microphone,
    SessionController,
};

type ConsoleRecognizer = LineRecognizer<BufReader<Stdin>>;

#[derive(Parser)]
#[command(name = "voice-avatar", version, about = "Talk to a remote assistant through an animated avatar")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/voice-avatar")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hold a conversation in the terminal; each typed line is one utterance
    Talk,
    /// Expose the session over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Avatar v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Reply endpoint: {}", cfg.remote.endpoint);
    info!("Avatar: {}", cfg.avatar.variant.label());

    match cli.command {
        Commands::Talk => talk(cfg).await,
        Commands::Serve => serve(cfg).await,
    }
}

fn build_capabilities(cfg: &Config, recognizer: Arc<ConsoleRecognizer>) -> Result<Capabilities> {
    let source: Arc<dyn FrameSource> = match &cfg.capture.input_wav {
        Some(path) => Arc::new(WavFileSource::new(path)),
        None => Arc::new(SilenceSource),
    };

    let reply = HttpReplyClient::new(cfg.remote.endpoint.clone(), cfg.remote.timeout())
        .context("Failed to create reply client")?;

    Ok(Capabilities {
        microphone: Arc::new(Microphone::new(source)),
        recognizer,
        synthesizer: Arc::new(ConsoleSynthesizer::new(
            cfg.synthesis.voices.clone(),
            cfg.synthesis.words_per_minute,
        )),
        player: Arc::new(BufferedPlayer::default()),
        reply: Arc::new(reply),
    })
}

fn console_recognizer() -> Arc<ConsoleRecognizer> {
    Arc::new(LineRecognizer::new(BufReader::new(tokio::io::stdin())))
}

async fn talk(cfg: Config) -> Result<()> {
    let recognizer = console_recognizer();
    let capabilities = build_capabilities(&cfg, Arc::clone(&recognizer))?;
    let controller = SessionController::new(capabilities, cfg.session.clone());
    let (handle, task) = ControllerHandle::spawn(controller);
    let (mut frames, presenter) = spawn_presenter(
        cfg.avatar.variant,
        cfg.avatar.mouth_interval(),
        handle.subscribe(),
    );

    let renderer = tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let frame = *frames.borrow_and_update();
            eprint!("\r{} ", frame);
        }
    });

    println!("Say something (type a line). Empty line is silence, Ctrl-D quits.");
    loop {
        let previous = handle.snapshot().generation;
        handle.start().await?;
        let snapshot = handle
            .wait_for(|s| s.generation > previous && s.state.is_terminal())
            .await?;

        if recognizer.is_exhausted() {
            break;
        }
        if let Some(error) = snapshot.error {
            println!("\n! {}", error.message);
            handle.acknowledge().await?;
        }
    }

    handle.shutdown().await?;
    task.await.context("Session controller panicked")?;
    presenter.abort();
    renderer.abort();
    println!();
    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let capabilities = build_capabilities(&cfg, console_recognizer())?;
    let controller = SessionController::new(capabilities, cfg.session.clone());
    let (handle, task) = ControllerHandle::spawn(controller);
    let (frames, presenter) = spawn_presenter(
        cfg.avatar.variant,
        cfg.avatar.mouth_interval(),
        handle.subscribe(),
    );

    let app = create_router(AppState::new(handle.clone(), frames));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    handle.shutdown().await?;
    task.await.context("Session controller panicked")?;
    presenter.abort();
    Ok(())
}
