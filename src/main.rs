use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use git_changelog::cli::{apply_package_version, build_changelog, write_output};
use git_changelog::config::{self, Limit, Options, SortCommits, DEFAULT_PACKAGE_FILE};
use git_changelog::git::SystemGit;
use git_changelog::ui::{self, Reporter};

#[derive(clap::Parser)]
#[command(
    name = "git-changelog",
    about = "Generate a changelog from git tags and commit history",
    disable_version_flag = true
)]
struct Args {
    #[arg(short, long, help = "Output file, default: CHANGELOG.md")]
    output: Option<String>,

    #[arg(short, long, help = "Config file location, default: .auto-changelog.toml")]
    config: Option<String>,

    #[arg(short, long, help = "Template to use [compact, keepachangelog, json], a Handlebars file or a URL")]
    template: Option<String>,

    #[arg(short, long, help = "Git remote to use for links, default: origin")]
    remote: Option<String>,

    #[arg(
        short,
        long,
        num_args = 0..=1,
        default_missing_value = DEFAULT_PACKAGE_FILE,
        help = "Use version from file as latest release, default: package.json"
    )]
    package: Option<String>,

    #[arg(short = 'v', long, help = "Use specified version as latest release")]
    latest_version: Option<String>,

    #[arg(short, long, help = "Include section for unreleased changes")]
    unreleased: bool,

    #[arg(short = 'l', long, help = "Number of commits to display per release, or false")]
    commit_limit: Option<Limit>,

    #[arg(short, long, help = "Number of commits to backfill empty releases with, or false")]
    backfill_limit: Option<Limit>,

    #[arg(long, help = "Override url for commits, use {id} for commit id")]
    commit_url: Option<String>,

    #[arg(short, long, help = "Override url for issues, use {id} for issue id")]
    issue_url: Option<String>,

    #[arg(long, help = "Override url for merges, use {id} for merge id")]
    merge_url: Option<String>,

    #[arg(long, help = "Override url for compares, use {from} and {to} for tags")]
    compare_url: Option<String>,

    #[arg(long, help = "Override regex pattern for issues in commit messages")]
    issue_pattern: Option<String>,

    #[arg(long, help = "Regex pattern for breaking change commits")]
    breaking_pattern: Option<String>,

    #[arg(long, help = "Add custom regex pattern for merge commits")]
    merge_pattern: Option<String>,

    #[arg(long, help = "Pattern to ignore when parsing commits")]
    ignore_commit_pattern: Option<String>,

    #[arg(long, help = "Pattern a commit subject must match to be listed")]
    commit_pattern: Option<String>,

    #[arg(long, help = "Override regex pattern for version tags")]
    tag_pattern: Option<String>,

    #[arg(long, help = "Prefix used in version tags")]
    tag_prefix: Option<String>,

    #[arg(long, help = "Pattern used to rewrite tags before reading the version")]
    tag_parser_pattern: Option<String>,

    #[arg(long, help = "Replacement used with --tag-parser-pattern")]
    tag_parser_replacement: Option<String>,

    #[arg(long, help = "Starting commit to use for changelog generation")]
    starting_commit: Option<String>,

    #[arg(long, help = "Specify earliest version to include in changelog")]
    starting_version: Option<String>,

    #[arg(long, help = "Specify earliest date (YYYY-MM-DD) to include in changelog")]
    starting_date: Option<String>,

    #[arg(long, help = "Specify latest version to include in changelog")]
    ending_version: Option<String>,

    #[arg(long, help = "Sort commits by property [relevance, date, date-desc, subject, subject-desc]")]
    sort_commits: Option<SortCommits>,

    #[arg(long, value_delimiter = ',', help = "Include tags from other branches")]
    include_branch: Vec<String>,

    #[arg(long, help = "Use tagged commit message body as release summary")]
    release_summary: bool,

    #[arg(long, help = "Only output unreleased changes")]
    unreleased_only: bool,

    #[arg(long, help = "Hide releases with no changes")]
    hide_empty_releases: bool,

    #[arg(long, help = "Hide the generator credit line")]
    hide_credit: bool,

    #[arg(long, help = "String to append to git log command")]
    append_git_log: Option<String>,

    #[arg(long, help = "String to append to git tag command")]
    append_git_tag: Option<String>,

    #[arg(long, help = "Prepend changelog to the output file")]
    prepend: bool,

    #[arg(long, help = "Output changelog to stdout")]
    stdout: bool,

    #[arg(long, help = "Log diagnostic output to stderr")]
    verbose: bool,

    #[arg(short = 'V', long, help = "Print version information")]
    version: bool,
}

impl Args {
    /// Lay the flags that were given over the loaded options.
    fn apply(self, mut options: Options) -> Options {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        fn set_some<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut options.output, self.output);
        set(&mut options.template, self.template);
        set(&mut options.remote, self.remote);
        set_some(&mut options.package, self.package);
        set_some(&mut options.latest_version, self.latest_version);
        set(&mut options.commit_limit, self.commit_limit);
        set(&mut options.backfill_limit, self.backfill_limit);
        set_some(&mut options.commit_url, self.commit_url);
        set_some(&mut options.issue_url, self.issue_url);
        set_some(&mut options.merge_url, self.merge_url);
        set_some(&mut options.compare_url, self.compare_url);
        set_some(&mut options.issue_pattern, self.issue_pattern);
        set_some(&mut options.breaking_pattern, self.breaking_pattern);
        set_some(&mut options.merge_pattern, self.merge_pattern);
        set_some(&mut options.ignore_commit_pattern, self.ignore_commit_pattern);
        set_some(&mut options.commit_pattern, self.commit_pattern);
        set_some(&mut options.tag_pattern, self.tag_pattern);
        set(&mut options.tag_prefix, self.tag_prefix);
        set_some(&mut options.tag_parser_pattern, self.tag_parser_pattern);
        set_some(&mut options.tag_parser_replacement, self.tag_parser_replacement);
        set_some(&mut options.starting_commit, self.starting_commit);
        set_some(&mut options.starting_version, self.starting_version);
        set_some(&mut options.starting_date, self.starting_date);
        set_some(&mut options.ending_version, self.ending_version);
        set(&mut options.sort_commits, self.sort_commits);
        set(&mut options.append_git_log, self.append_git_log);
        set(&mut options.append_git_tag, self.append_git_tag);
        if !self.include_branch.is_empty() {
            options.include_branch = self.include_branch;
        }

        options.unreleased |= self.unreleased;
        options.unreleased_only |= self.unreleased_only;
        options.release_summary |= self.release_summary;
        options.hide_empty_releases |= self.hide_empty_releases;
        options.hide_credit |= self.hide_credit;
        options.prepend |= self.prepend;
        options.stdout |= self.stdout;
        options
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("git-changelog {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut options = args_over_config(args)?;
    apply_package_version(&mut options)?;

    let reporter = Reporter::new(options.stdout);
    let repo = SystemGit::open(".")?;
    let changelog = build_changelog(&repo, &options, Utc::now(), &reporter)?;
    let bytes = write_output(&changelog.text, &options)?;

    reporter.success(&ui::written_message(bytes, &options.output));
    Ok(())
}

fn args_over_config(args: Args) -> Result<Options> {
    let options = config::load_options(args.config.as_deref())?;
    Ok(args.apply(options))
}
