use anyhow::{Ok, Result};

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Statement {
    Insert(i32),
    Remove(i32),
    Search(i32),
    Select(usize),
    Predecessor(i32),
    Successor(i32),
    Path(i32),
    Print,
    Size,
    Check,
}

pub trait Parser {
    fn parse_lines(&self, s: &str) -> Result<Vec<Statement>>;
    fn parse_line(&self, s: &str) -> Result<Statement>;
}

pub struct ParserVagaba {}

impl ParserVagaba {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ParserVagaba {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ParserVagaba {
    fn parse_lines(&self, s: &str) -> Result<Vec<Statement>> {
        let mut vec: Vec<Statement> = Vec::new();

        for line in s.lines() {
            let stm = self.parse_line(line)?;
            vec.push(stm);
        }

        Ok(vec)
    }

    fn parse_line(&self, s: &str) -> Result<Statement> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.is_empty() || tokens.len() > 2 {
            anyhow::bail!("Passando parametro de menos ou mais doto");
        }

        let stm = tokens[0];

        if tokens.len() == 1 {
            return match stm.to_lowercase().as_str() {
                "imp" => Ok(Statement::Print),
                "tam" => Ok(Statement::Size),
                "che" => Ok(Statement::Check),
                e => anyhow::bail!("Não esperado esse caba {}", e),
            };
        }

        match stm.to_lowercase().as_str() {
            "inc" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Insert(value))
            }
            "rem" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Remove(value))
            }
            "bus" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Search(value))
            }
            "sel" => {
                let rank: usize = tokens[1].parse()?;
                Ok(Statement::Select(rank))
            }
            "pre" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Predecessor(value))
            }
            "suc" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Successor(value))
            }
            "cam" => {
                let value: i32 = tokens[1].parse()?;
                Ok(Statement::Path(value))
            }
            e => anyhow::bail!("Não esperado esse caba {}", e),
        }
    }
}
