use std::{
    fs::File,
    io::{self, Read, Write},
    path::PathBuf,
};
const INFINITE_KEYWORD: &str = "INFINITO";
const NULL_KEYWORD: &str = "NULO";

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use shikoku::megumi::{
    cli::Cli,
    parser::{self, Parser as _, Statement},
    Color, Megumi,
};

fn read_from_stdin(buf: &mut String) -> Result<()> {
    let mut stdin = io::stdin();
    stdin.read_to_string(buf)?;

    Ok(())
}

fn read_from_file(buf: &mut String, path: PathBuf) -> Result<()> {
    let mut f = File::open(path)?;
    f.read_to_string(buf)?;

    Ok(())
}

fn format_path(megumi: &Megumi<i32, i32>, key: i32) -> String {
    let (steps, found) = megumi.search_path(&key);
    if steps.is_empty() {
        return NULL_KEYWORD.to_string();
    }

    let mut path = steps
        .iter()
        .map(|step| {
            let color = match step.color {
                Color::Red => "RED",
                Color::Black => "BLACK",
            };
            format!("({}, {})", step.key, color)
        })
        .join(" -> ");

    if !found {
        path.push_str(" -> ");
        path.push_str(NULL_KEYWORD);
    }

    path
}

fn process_statements(stms: Vec<Statement>) -> Result<String> {
    let mut megumi: Megumi<i32, i32> = Megumi::default();
    let mut str_list: Vec<String> = Vec::new();

    for stm in stms {
        match stm {
            parser::Statement::Insert(value) => {
                megumi.insert(value, value);
            }
            parser::Statement::Remove(value) => {
                if megumi.remove(&value).is_err() {
                    str_list.push(NULL_KEYWORD.to_string());
                }
            }
            parser::Statement::Search(value) => match megumi.search(&value) {
                Ok(found) => str_list.push(format!("{found}")),
                Err(_) => str_list.push(NULL_KEYWORD.to_string()),
            },
            parser::Statement::Select(rank) => match megumi.select(rank) {
                Ok((key, _)) => str_list.push(format!("{key}")),
                Err(_) => str_list.push(NULL_KEYWORD.to_string()),
            },
            parser::Statement::Predecessor(value) => match megumi.predecessor(&value) {
                Ok(Some((key, _))) => str_list.push(format!("{key}")),
                Ok(None) => str_list.push(INFINITE_KEYWORD.to_string()),
                Err(_) => str_list.push(NULL_KEYWORD.to_string()),
            },
            parser::Statement::Successor(value) => match megumi.successor(&value) {
                Ok(Some((key, _))) => str_list.push(format!("{key}")),
                Ok(None) => str_list.push(INFINITE_KEYWORD.to_string()),
                Err(_) => str_list.push(NULL_KEYWORD.to_string()),
            },
            parser::Statement::Path(value) => {
                str_list.push(format_path(&megumi, value));
            }
            parser::Statement::Print => {
                let list: Vec<String> = megumi.iter().map(|(key, _)| key.to_string()).collect();
                let res = list.join(" ");
                str_list.push(res);
            }
            parser::Statement::Size => {
                str_list.push(megumi.len().to_string());
            }
            parser::Statement::Check => match megumi.validate() {
                Ok(()) => str_list.push("OK".to_string()),
                Err(e) => str_list.push(format!("{e}")),
            },
        }
    }

    let res = str_list.join("\n");

    Ok(res)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut buf = String::new();

    match cli.input {
        Some(path) => read_from_file(&mut buf, path)?,
        None => read_from_stdin(&mut buf)?,
    }

    let mut writer: Box<dyn Write>;

    writer = match cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    let parser = parser::ParserVagaba::default();
    let stms = parser.parse_lines(&buf)?;

    let mut output_string = process_statements(stms)?;

    if cli.new_line {
        output_string.push('\n');
    }
    writer.write_all(output_string.as_bytes())?;

    Ok(())
}
