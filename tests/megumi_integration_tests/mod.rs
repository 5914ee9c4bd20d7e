use shikoku::megumi::{
    parser::{Parser, ParserVagaba, Statement},
    Color, Megumi,
};

use anyhow::{bail, Result};
use itertools::Itertools;
use pretty_assertions::assert_eq;

const INFINITE_KEYWORD: &str = "INFINITO";
const NULL_KEYWORD: &str = "NULO";

/// Runs one statement against the tree and reports the line it prints, the
/// same way the megumi binary does.
fn apply(megumi: &mut Megumi<i32, i32>, stm: Statement) -> Option<String> {
    match stm {
        Statement::Insert(value) => {
            megumi.insert(value, value);
            None
        }
        Statement::Remove(value) => match megumi.remove(&value) {
            Ok(()) => None,
            Err(_) => Some(NULL_KEYWORD.to_string()),
        },
        Statement::Search(value) => match megumi.search(&value) {
            Ok(found) => Some(found.to_string()),
            Err(_) => Some(NULL_KEYWORD.to_string()),
        },
        Statement::Select(rank) => match megumi.select(rank) {
            Ok((key, _)) => Some(key.to_string()),
            Err(_) => Some(NULL_KEYWORD.to_string()),
        },
        Statement::Predecessor(value) => match megumi.predecessor(&value) {
            Ok(Some((key, _))) => Some(key.to_string()),
            Ok(None) => Some(INFINITE_KEYWORD.to_string()),
            Err(_) => Some(NULL_KEYWORD.to_string()),
        },
        Statement::Successor(value) => match megumi.successor(&value) {
            Ok(Some((key, _))) => Some(key.to_string()),
            Ok(None) => Some(INFINITE_KEYWORD.to_string()),
            Err(_) => Some(NULL_KEYWORD.to_string()),
        },
        Statement::Path(value) => {
            let (steps, found) = megumi.search_path(&value);
            if steps.is_empty() {
                return Some(NULL_KEYWORD.to_string());
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
            Some(path)
        }
        Statement::Print => {
            let keys: Vec<String> = megumi.iter().map(|(key, _)| key.to_string()).collect();
            Some(keys.join(" "))
        }
        Statement::Size => Some(megumi.len().to_string()),
        Statement::Check => match megumi.validate() {
            Ok(()) => Some("OK".to_string()),
            Err(e) => Some(format!("{e}")),
        },
    }
}

#[test]
fn only_insert_and_validate() -> Result<()> {
    // Arrange
    let str = include_str!("./inputs/01.txt");
    let p = ParserVagaba::default();
    let mut megumi: Megumi<i32, i32> = Megumi::default();

    let stms = p.parse_lines(str)?;

    // Act
    for stm in stms {
        match stm {
            Statement::Insert(value) => megumi.insert(value, value),
            _ => bail!("Should not come here"),
        }
    }

    // Assert
    megumi.validate()?;
    assert_eq!(10, megumi.len());
    let keys: Vec<i32> = megumi.iter().map(|(key, _)| *key).collect();
    assert_eq!(vec![10, 20, 30, 40, 50, 55, 60, 70, 80, 90], keys);

    Ok(())
}

#[test]
fn mixed_statements_report_expected_lines() -> Result<()> {
    // Arrange
    let str = include_str!("./inputs/02.txt");
    let p = ParserVagaba::default();
    let mut megumi: Megumi<i32, i32> = Megumi::default();
    let expected = [
        "9",
        "1",
        "7",
        "7",
        "10",
        INFINITE_KEYWORD,
        INFINITE_KEYWORD,
        "6",
        NULL_KEYWORD,
        "1 4 6 7 8 10 13 14",
        "OK",
    ]
    .join("\n");

    // Act
    let stms = p.parse_lines(str)?;
    let actual = stms
        .into_iter()
        .filter_map(|stm| apply(&mut megumi, stm))
        .join("\n");

    // Assert
    assert_eq!(expected, actual);

    Ok(())
}

#[test]
fn rank_scenario_with_root_removal() -> Result<()> {
    // Arrange
    let str = include_str!("./inputs/03.txt");
    let p = ParserVagaba::default();
    let mut megumi: Megumi<i32, i32> = Megumi::default();
    let expected = [
        "50",
        "(50, BLACK) -> (70, BLACK) -> (60, RED)",
        "OK",
        "20 30 40 60 70 80",
        "6",
    ]
    .join("\n");

    // Act
    let stms = p.parse_lines(str)?;
    let actual = stms
        .into_iter()
        .filter_map(|stm| apply(&mut megumi, stm))
        .join("\n");

    // Assert
    assert_eq!(expected, actual);

    Ok(())
}
