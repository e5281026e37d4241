use anyhow::{Context, Result, bail};
use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::{
    env, fs,
    io::{Write, stdout},
    path::{Path, PathBuf},
    process,
};
use treetag_config::TagRuleConfig;
use treetag_engine::{HighlighterSession, HostWidget, Language, MemoryWidget, TextRange};

const USAGE: &str = "Usage: treetag <file> [--language NAME] [--rows FIRST:LAST] [--rules-dir DIR] [--dump]
       treetag --languages [--rules-dir DIR]";

#[derive(Debug, Default, PartialEq)]
struct Options {
    file: Option<PathBuf>,
    language: Option<String>,
    rows: Option<(usize, usize)>,
    rules_dir: Option<PathBuf>,
    dump: bool,
    list_languages: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--language" | "-l" => {
                let name = args.next().context("--language needs a name")?;
                options.language = Some(name.clone());
            }
            "--rows" => {
                let rows = args.next().context("--rows needs FIRST:LAST")?;
                options.rows = Some(parse_rows(rows)?);
            }
            "--rules-dir" => {
                let dir = args.next().context("--rules-dir needs a directory")?;
                options.rules_dir = Some(PathBuf::from(dir));
            }
            "--dump" => options.dump = true,
            "--languages" => options.list_languages = true,
            flag if flag.starts_with('-') => bail!("unknown option {flag}"),
            file => {
                if options.file.is_some() {
                    bail!("only one file can be highlighted at a time");
                }
                options.file = Some(PathBuf::from(file));
            }
        }
    }

    if options.file.is_none() && !options.list_languages {
        bail!("no file given");
    }
    Ok(options)
}

fn parse_rows(rows: &str) -> Result<(usize, usize)> {
    let (first, last) = rows
        .split_once(':')
        .with_context(|| format!("rows must look like FIRST:LAST, got {rows:?}"))?;
    let first: usize = first.parse().with_context(|| format!("bad first row {first:?}"))?;
    let last: usize = last.parse().with_context(|| format!("bad last row {last:?}"))?;
    if last < first {
        bail!("last row {last} is before first row {first}");
    }
    Ok((first, last))
}

fn detect_language(file: &Path) -> Result<Language> {
    let extension = file
        .extension()
        .and_then(|extension| extension.to_str())
        .with_context(|| format!("{} has no extension, use --language", file.display()))?;
    Language::from_extension(extension)
        .with_context(|| format!("no grammar for .{extension} files, use --language"))
}

fn list_languages(rules_dir: &Path) -> Result<()> {
    println!("Bundled:");
    for language in Language::ALL {
        println!("  {}", language.name());
    }

    let overrides = TagRuleConfig::available_languages(rules_dir)?;
    println!("In {}:", rules_dir.display());
    if overrides.is_empty() {
        println!("  (none)");
    }
    for name in overrides {
        let supported = if Language::from_name(&name).is_some() {
            ""
        } else {
            " (no grammar, ignored)"
        };
        println!("  {name}{supported}");
    }
    Ok(())
}

/// Terminal colour for a tag, decided by its most specific known prefix.
fn style_for(tag: &str) -> Option<(Color, bool)> {
    const STYLES: &[(&str, Color, bool)] = &[
        ("Token.Generic.Heading", Color::Blue, true),
        ("Token.Generic.Subheading", Color::Blue, false),
        ("Token.Keyword.Constant", Color::DarkYellow, false),
        ("Token.Keyword", Color::Magenta, true),
        ("Token.Name.Builtin", Color::Cyan, false),
        ("Token.Name.Function", Color::Blue, false),
        ("Token.Name.Class", Color::Blue, true),
        ("Token.Name.Decorator", Color::Yellow, false),
        ("Token.Literal.String", Color::Green, false),
        ("Token.Literal.Number", Color::DarkYellow, false),
        ("Token.Comment", Color::DarkGrey, false),
        ("Token.Punctuation", Color::DarkGrey, false),
    ];

    STYLES
        .iter()
        .find(|(prefix, _, _)| {
            tag.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
        .map(|&(_, color, bold)| (color, bold))
}

/// Tag of every character on the rows of `range`, as drawn in `widget`.
fn tags_per_char<'a>(widget: &'a MemoryWidget, range: TextRange) -> Vec<(String, Vec<Option<&'a str>>)> {
    let text = widget.text(range);
    let mut lines: Vec<(String, Vec<Option<&str>>)> = text
        .lines()
        .map(|line| (line.to_string(), vec![None; line.chars().count()]))
        .collect();

    for (span, tag) in widget.spans() {
        for (offset, (_, tags)) in lines.iter_mut().enumerate() {
            let row = range.start.row + offset;
            if row < span.start.row || row > span.end.row {
                continue;
            }
            let from = if row == span.start.row { span.start.column } else { 0 };
            let to = if row == span.end.row { span.end.column } else { tags.len() };
            for slot in tags.iter_mut().take(to).skip(from) {
                *slot = Some(tag);
            }
        }
    }
    lines
}

fn print_coloured(widget: &MemoryWidget, range: TextRange) -> Result<()> {
    let mut out = stdout().lock();

    for (line, tags) in tags_per_char(widget, range) {
        let mut current: Option<&str> = None;
        for (c, tag) in line.chars().zip(tags) {
            if tag != current {
                queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
                if let Some((color, bold)) = tag.and_then(style_for) {
                    queue!(out, SetForegroundColor(color))?;
                    if bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                }
                current = tag;
            }
            queue!(out, Print(c))?;
        }
        queue!(out, ResetColor, SetAttribute(Attribute::Reset), Print('\n'))?;
    }
    out.flush()?;
    Ok(())
}

fn run(options: Options) -> Result<()> {
    let rules_dir = options.rules_dir.unwrap_or_else(TagRuleConfig::rules_dir);
    if options.list_languages {
        return list_languages(&rules_dir);
    }
    let Some(file) = options.file else {
        bail!("no file given");
    };

    let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let language = match &options.language {
        Some(name) => Language::from_name(name).with_context(|| format!("unknown language {name}"))?,
        None => detect_language(&file)?,
    };
    log::info!("highlighting {} as {}", file.display(), language.name());

    let mut widget = MemoryWidget::new(&text);
    if let Some((first, last)) = options.rows {
        widget.set_visible_range(TextRange::rows(first, last));
    }
    let visible = widget.visible_range();
    let session = HighlighterSession::for_language(widget, language.name(), Some(rules_dir.as_path()))
        .with_context(|| format!("setting up {} highlighting", language.name()))?;

    if options.dump {
        for highlight in session.highlights(visible) {
            println!("{} {}", highlight.range, highlight.action.as_str());
        }
        return Ok(());
    }
    print_coloured(session.host(), visible)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    run(options)
}
