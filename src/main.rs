use clap::{Parser, Subcommand};
use imgapi::address::{UrlContext, image_descriptor, image_url};
use imgapi::attrs::Attributes;
use imgapi::config::{self, EndpointConfig, SiteConfig};
use imgapi::imaging::{ImageBackend, RustBackend};
use imgapi::logging::{LoggingConfig, init_logging};
use imgapi::store::{ContentStore, ImageFile};
use imgapi::url_builder::RequestOrigin;
use imgapi::{output, server};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Parse a `key=value` pair for `--attr`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Flags shared by commands that build links.
#[derive(clap::Args, Clone)]
struct LinkArgs {
    /// Image URI relative to the content root, e.g. blog/post-1/cover.jpg
    uri: String,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Crop to exactly width x height instead of fitting inside
    #[arg(long)]
    crop: bool,

    /// Output quality (1-100)
    #[arg(long)]
    quality: Option<u32>,

    /// Extra query attribute, repeatable
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    attrs: Vec<(String, String)>,

    /// Request host to build absolute URLs against
    #[arg(long)]
    host: Option<String>,

    /// Treat the request host as served over TLS
    #[arg(long)]
    tls: bool,
}

impl LinkArgs {
    fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        if let Some(width) = self.width {
            attrs.set("width", width);
        }
        if let Some(height) = self.height {
            attrs.set("height", height);
        }
        if self.crop {
            attrs.set("crop", true);
        }
        if let Some(quality) = self.quality {
            attrs.set("quality", quality);
        }
        for (key, value) in &self.attrs {
            attrs.set(key.clone(), value.clone());
        }
        attrs
    }

    fn context(&self, endpoint: &EndpointConfig) -> UrlContext {
        let request = self
            .host
            .as_ref()
            .map(|host| RequestOrigin::new(host.clone(), self.tls));
        UrlContext::new(endpoint, request.as_ref())
    }
}

#[derive(Parser)]
#[command(name = "imgapi")]
#[command(about = "Image transform endpoint for file-based content")]
#[command(long_about = "\
Image transform endpoint for file-based content

Serves resized and cropped versions of the images in a content directory,
and builds the URLs that point at them.

Content structure:

  content/
  ├── config.toml                  # Endpoint config (optional)
  ├── logo.png                     # → logo.png
  └── 010-blog/                    # Numbered directory, addressed as `blog`
      ├── header.png               # → blog/header.png
      └── 003-post-1/
          └── cover.jpg            # → blog/post-1/cover.jpg

Requests:

  GET /imgapi/blog/post-1/cover.jpg?width=400              fit inside 400px wide
  GET /imgapi/blog/post-1/cover.jpg?width=200&height=200&crop=1
  GET /imgapidata/blog/post-1/cover.jpg?width=400          JSON descriptor

Run 'imgapi gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory (defaults to `content`, or the config's content_root
    /// when --config is given)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Config file (defaults to config.toml in the content directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP endpoint
    Serve {
        /// Listen address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the transform URL for an image
    Url(LinkArgs),
    /// Print the descriptor for an image as JSON
    Descriptor(LinkArgs),
    /// List every addressable image
    List,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Load the config and work out the content root.
///
/// `--source` always wins. Without it, a `--config` file's `content_root`
/// is taken relative to the file's directory; otherwise the root is
/// `content` and its own `config.toml` is read.
fn load_site(cli: &Cli) -> Result<(SiteConfig, PathBuf), config::ConfigError> {
    match (&cli.source, &cli.config) {
        (Some(source), Some(config_path)) => {
            Ok((config::load_config_file(config_path)?, source.clone()))
        }
        (Some(source), None) => Ok((config::load_config(source)?, source.clone())),
        (None, Some(config_path)) => {
            let site = config::load_config_file(config_path)?;
            let base = config_path.parent().unwrap_or(Path::new("."));
            let root = base.join(&site.content_root);
            Ok((site, root))
        }
        (None, None) => {
            let root = PathBuf::from("content");
            Ok((config::load_config(&root)?, root))
        }
    }
}

fn find_image(store: &ContentStore, uri: &str) -> Result<ImageFile, Box<dyn std::error::Error>> {
    store
        .find(uri)
        .ok_or_else(|| format!("no image at `{uri}` under {}", store.root().display()).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    init_logging(LoggingConfig {
        level: cli.log_level,
        json_format: cli.log_json,
    });

    let (mut site, root) = load_site(&cli)?;
    let endpoint = EndpointConfig::from_site_config(&site);
    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
    let store = ContentStore::new(&root, backend);

    match &cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                site.server.host = host.clone();
            }
            if let Some(port) = port {
                site.server.port = *port;
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::serve(&site, root))?;
        }
        Command::Url(args) => {
            let image = find_image(&store, &args.uri)?;
            println!(
                "{}",
                image_url(&image, args.attributes(), &args.context(&endpoint))
            );
        }
        Command::Descriptor(args) => {
            let image = find_image(&store, &args.uri)?;
            let descriptor = image_descriptor(&image, args.attributes(), &args.context(&endpoint));
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Command::List => {
            let ctx = UrlContext::new(&endpoint, None);
            output::print_listing(&store.list(), &ctx);
        }
        Command::GenConfig => {}
    }

    Ok(())
}
