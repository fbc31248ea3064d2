use clap::Parser;
use miette::Result;
use cfadmin::cli::commands;
use cfadmin::cli::{logging, Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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

    let cli = Cli::parse();
    let global = cli.global;
    logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Campaign(cmd) => commands::campaign::run(cmd, &global),
        Commands::Withdrawal(cmd) => commands::withdrawal::run(cmd, &global),
        Commands::Bank(cmd) => commands::bank::run(cmd, &global),
        Commands::Language(cmd) => commands::language::run(cmd, &global),
        Commands::Translation(cmd) => commands::translation::run(cmd, &global),
        Commands::Status(args) => commands::status::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
