//! Tokenizer for the surface grammar.
//!
//! Both the ASCII and Unicode spelling of every token are accepted side
//! by side (`->`/`→`, `\`/`λ`, `*`/`⊗`, `<>`/`⟨⟩`, `U`/`𝘜`, `I`/`𝟭ₘ`,
//! `T`/`⊤`, `w`/`ω`) so that a script can freely mix the two. Reserved
//! words lex to dedicated keyword tokens and are therefore never
//! produced as `Ident`, which is what keeps them out of identifier
//! position by construction rather than by a post-hoc check.

use logos::{Lexer, Logos};

/// Skip a `{- ... -}` block comment, which may nest.
fn skip_block_comment(lex: &mut Lexer<Token>) -> logos::Skip {
    let rest = lex.remainder();
    let mut depth = 1usize;
    let mut consumed = 0usize;
    let bytes = rest.as_bytes();
    while consumed < bytes.len() && depth > 0 {
        if bytes[consumed..].starts_with(b"{-") {
            depth += 1;
            consumed += 2;
        } else if bytes[consumed..].starts_with(b"-}") {
            depth -= 1;
            consumed += 2;
        } else {
            consumed += 1;
        }
    }
    lex.bump(consumed);
    logos::Skip
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"--[^\n]*")]
pub enum Token {
    #[token("{-", skip_block_comment)]
    BlockCommentStart,

    #[token("assume")]
    Assume,
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token("return")]
    Return,
    #[token("forall")]
    Forall,
    #[token("fst")]
    Fst,
    #[token("snd")]
    Snd,

    #[token("U")]
    #[token("𝘜")]
    Universe,
    #[token("I")]
    #[token("𝟭ₘ")]
    MUnitType,
    #[token("T")]
    #[token("⊤")]
    AUnitType,
    #[token("unit")]
    AUnitValue,

    #[token("->")]
    #[token("→")]
    Arrow,
    #[token("\\")]
    #[token("λ")]
    Backslash,
    #[token("*")]
    #[token("⊗")]
    Star,
    #[token("&")]
    Amp,
    #[token("<>")]
    #[token("⟨⟩")]
    MUnitValue,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    #[token("⟨")]
    LAngle,
    #[token(">")]
    #[token("⟩")]
    RAngle,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,

    #[token("0")]
    UsageZero,
    #[token("1")]
    UsageOne,
    #[token("w")]
    #[token("ω")]
    UsageMany,

    #[token(":quit")]
    CmdQuit,
    #[token(":type")]
    CmdType,
    #[token(":browse")]
    CmdBrowse,
    #[token(":load")]
    CmdLoad,
    #[token(":help")]
    CmdHelp,

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    StringLit(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_'-]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        Token::lexer(src).filter_map(|t| t.ok()).collect()
    }

    #[test]
    fn lexes_ascii_and_unicode_arrows_identically() {
        assert_eq!(lex_all("->"), vec![Token::Arrow]);
        assert_eq!(lex_all("→"), vec![Token::Arrow]);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(lex_all("assume"), vec![Token::Assume]);
        assert_eq!(lex_all("fst"), vec![Token::Fst]);
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(lex_all("x -- trailing comment\ny"), vec![
            Token::Ident("x".to_string()),
            Token::Ident("y".to_string()),
        ]);
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        assert_eq!(lex_all("x {- outer {- inner -} still outer -} y"), vec![
            Token::Ident("x".to_string()),
            Token::Ident("y".to_string()),
        ]);
    }

    #[test]
    fn usage_prefixes_and_identifiers_are_distinct() {
        assert_eq!(lex_all("0 1 w ω"), vec![
            Token::UsageZero,
            Token::UsageOne,
            Token::UsageMany,
            Token::UsageMany,
        ]);
    }

    #[test]
    fn repl_commands_lex_as_keywords() {
        assert_eq!(lex_all(":type x"), vec![Token::CmdType, Token::Ident("x".to_string())]);
    }
}
