use std::collections::{BTreeSet, HashSet};

use super::{QueryError, SearchQuery};
use crate::index::InvertedIndex;
use crate::tokenizer::tokenize;
use crate::DocId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Term(String),
}

fn describe(token: &Token) -> String {
    match token {
        Token::And => "AND".to_string(),
        Token::Or => "OR".to_string(),
        Token::Not => "NOT".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Term(term) => term.clone(),
    }
}

/// Split a query into operator keywords, parentheses and terms. Terms are
/// stemmed and stop-word-filtered like document text; dropped stop words
/// vanish from both the token stream and the search-term set.
fn lex(query: &str) -> (Vec<Token>, BTreeSet<String>) {
    let mut tokens = Vec::new();
    let mut search_terms = BTreeSet::new();
    let spaced = query.replace('(', " ( ").replace(')', " ) ");
    for raw in spaced.split_whitespace() {
        match raw {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            "NOT" => tokens.push(Token::Not),
            "(" => tokens.push(Token::LParen),
            ")" => tokens.push(Token::RParen),
            word => {
                for term in tokenize(word) {
                    search_terms.insert(term.clone());
                    tokens.push(Token::Term(term));
                }
            }
        }
    }
    (tokens, search_terms)
}

/// Boolean query over the index: NOT binds tighter than AND/OR, AND/OR are
/// left-associative, parentheses group. Evaluates directly to doc-id sets.
#[derive(Debug)]
pub struct BooleanQuery {
    matches: HashSet<DocId>,
    search_terms: BTreeSet<String>,
}

impl BooleanQuery {
    pub fn parse(index: &InvertedIndex, query: &str) -> Result<Self, QueryError> {
        let (tokens, search_terms) = lex(query);
        let matches = if tokens.is_empty() {
            HashSet::new()
        } else {
            let mut parser = Parser {
                index,
                tokens,
                pos: 0,
            };
            let matches = parser.expr()?;
            if let Some(token) = parser.peek() {
                return Err(QueryError::TrailingToken(describe(token)));
            }
            matches
        };
        Ok(Self {
            matches,
            search_terms,
        })
    }
}

impl SearchQuery for BooleanQuery {
    fn matches(&self) -> &HashSet<DocId> {
        &self.matches
    }

    fn search_terms(&self) -> &BTreeSet<String> {
        &self.search_terms
    }
}

struct Parser<'a> {
    index: &'a InvertedIndex,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// expr := term (('AND' | 'OR') term)*
    fn expr(&mut self) -> Result<HashSet<DocId>, QueryError> {
        let mut current = self.term()?;
        while matches!(self.peek(), Some(Token::And | Token::Or)) {
            let op = self.next().expect("operator was peeked");
            let rhs = self.term()?;
            current = match op {
                Token::And => current.intersection(&rhs).copied().collect(),
                Token::Or => current.union(&rhs).copied().collect(),
                _ => unreachable!(),
            };
        }
        Ok(current)
    }

    /// term := 'NOT' term | '(' expr ')' | STRING
    fn term(&mut self) -> Result<HashSet<DocId>, QueryError> {
        match self.next() {
            None | Some(Token::And) | Some(Token::Or) => Err(QueryError::MissingOperand),
            Some(Token::Not) => {
                let operand = self.term()?;
                Ok(self
                    .index
                    .all_doc_ids()
                    .difference(&operand)
                    .copied()
                    .collect())
            }
            Some(Token::Term(term)) => Ok(self.index.docs_with(&term)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(QueryError::UnclosedParenthesis),
                }
            }
            Some(Token::RParen) => Err(QueryError::UnexpectedParenthesis),
        }
    }
}
