use clap::Parser;
use miette::Result;
use uncertaintylib::cli::{self, Cli};

fn main() -> Result<()> {
    // Install miette's fancy error handler for diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let args = Cli::parse();
    cli::init_logging(&args.global);
    cli::dispatch(args)
}
