// main.rs      gifolio command
//
// Copyright (c) 2019-2026  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifolio::block::{ExtensionCode, Gif, SavedImage};
use gifolio::gcb::DisposalMethod;
use gifolio::{Decoder, Encoder};
use std::error::Error;
use std::ffi::OsStr;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches)?,
        ("copy", Some(matches)) => copy(matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifolio")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF file utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF image table")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("copy")
                .about("Decode a GIF into memory and encode it again")
                .arg(Arg::with_name("input").required(true).help("input file"))
                .arg(
                    Arg::with_name("output")
                        .required(true)
                        .help("output file"),
                ),
        )
}

/// Handle copy subcommand
fn copy(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let input = matches.value_of_os("input").ok_or("no input")?;
    let output = matches.value_of_os("output").ok_or("no output")?;
    let gif = Decoder::open(input)?.slurp()?;
    Encoder::create(output)?.spew(&gif)?;
    Ok(())
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let values = matches.values_of_os("files").ok_or("no files")?;
    for path in values {
        show_file(out, path)?;
    }
    Ok(())
}

/// Collect comment lines from extension blocks
fn comments(gif: &Gif) -> Vec<String> {
    let blocks = gif
        .images()
        .iter()
        .flat_map(|img| img.extensions().iter())
        .chain(gif.extensions().iter());
    let mut comments = vec![];
    let mut in_comment = false;
    for b in blocks {
        in_comment = match b.code() {
            ExtensionCode::Comment => true,
            ExtensionCode::Continuation => in_comment,
            _ => false,
        };
        if in_comment {
            for l in String::from_utf8_lossy(b.bytes()).split('\n') {
                let l = l.trim();
                if !l.is_empty() {
                    comments.push(l.to_string());
                }
            }
        }
    }
    comments
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let gif = Decoder::open(path)?.slurp()?;
    let images = gif.images();
    let image_digits = digits(images.len()).max(3);
    let screen = gif.screen();
    let size_digits =
        4.max(1 + digits(screen.width()) + digits(screen.height()));
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    out.set_color(&bold)?;
    let version = String::from_utf8_lossy(gif.version().stamp()).to_string();
    write!(out, "{}, images: {}", version, images.len())?;
    if let Some(c) = gif.loop_count() {
        write!(out, ", repeat: ")?;
        if c == 0 {
            write!(out, "∞")?;
        } else {
            write!(out, "{}", c)?;
        }
    }
    writeln!(out)?;
    let comments = comments(&gif);
    if !comments.is_empty() {
        out.set_color(&cyan)?;
        for c in comments {
            writeln!(out, "  # {}", c)?;
        }
    }
    out.set_color(&yellow)?;
    write!(out, " {:>w$}", "Im#", w = image_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn")?;
    let global_clr = screen.color_map().map_or(0, |m| m.len());
    for (number, image) in images.iter().enumerate() {
        let row = Row {
            image,
            width: screen.width(),
            height: screen.height(),
            global_clr,
            number,
            image_digits,
            size_digits,
        };
        row.show(out)?;
    }
    Ok(())
}

/// One row of the image table
struct Row<'a> {
    image: &'a SavedImage,
    width: u16,
    height: u16,
    global_clr: usize,
    number: usize,
    image_digits: usize,
    size_digits: usize,
}

impl Row<'_> {
    /// Show one image of a GIF file
    fn show(&self, out: &mut StandardStream) -> Result<(), Box<dyn Error>> {
        let mut dflt = ColorSpec::new();
        dflt.set_fg(Some(Color::White));
        let mut bold = ColorSpec::new();
        bold.set_fg(Some(Color::White))
            .set_intense(true)
            .set_bold(true);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        let desc = self.image.desc();
        let gcb = self.image.graphics_control()?;
        let has_gcb = self.image.graphics_control_count() > 0;
        out.set_color(&dflt)?;
        let interlaced = if desc.interlaced() { 'i' } else { ' ' };
        write!(out, "{}", interlaced)?;
        out.set_color(&bold)?;
        write!(out, "{:>w$}", self.number, w = self.image_digits)?;
        let d = gcb.delay_time_cs();
        if d == 0 {
            out.set_color(&dflt)?;
        }
        write!(out, " {:6.2}", d as f32 / 100f32)?;
        let d = if has_gcb {
            match gcb.disposal_method() {
                DisposalMethod::NoAction => "none",
                DisposalMethod::Keep => "keep",
                DisposalMethod::Background => "bg",
                DisposalMethod::Previous => "prev",
                DisposalMethod::Reserved(_) => "res",
            }
        } else {
            "-"
        };
        out.set_color(match d {
            "none" | "-" => &dflt,
            "res" => &red,
            _ => &bold,
        })?;
        write!(out, " {:>4}", d)?;
        if self.width == desc.width() && self.height == desc.height() {
            out.set_color(&dflt)?;
        } else {
            out.set_color(&bold)?;
        }
        write!(
            out,
            " {:>w$}",
            &format!("{}x{}", desc.width(), desc.height()),
            w = self.size_digits
        )?;
        if desc.left() == 0 && desc.top() == 0 {
            out.set_color(&dflt)?;
        } else {
            out.set_color(&bold)?;
        }
        write!(
            out,
            " {:>w$}",
            &format!("{},{}", desc.left(), desc.top()),
            w = self.size_digits
        )?;
        match desc.color_map() {
            Some(map) => {
                out.set_color(&bold)?;
                write!(out, "  {:3}", map.len())?;
            }
            None => {
                out.set_color(&dflt)?;
                write!(out, " {:3}g", self.global_clr)?;
            }
        }
        match gcb.transparent_color() {
            Some(tc) => {
                out.set_color(&bold)?;
                writeln!(out, " {:>3}", tc)?;
            }
            None => {
                out.set_color(&dflt)?;
                writeln!(out, " {:>3}", "-")?;
            }
        }
        Ok(())
    }
}

/// Calculate digits in a number
fn digits<T: Into<usize>>(v: T) -> usize {
    let v = v.into();
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
