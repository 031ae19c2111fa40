//! Spec text parser.
//!
//! Hand-written lexer and recursive-descent parser for the language the
//! emitter produces: entry blocks with key/value fields and a sprites
//! sub-block, script blocks with time markers, labels and instruction calls.
//! Parsing builds the typed archive plus the sprite/script symbol tables;
//! symbolic references stay unresolved until
//! [`crate::archive::write::resolve_symbols`] runs.

use anyhow::{Context as _, Result, bail};
use hashbrown::HashMap;

use crate::archive::{
    Archive, Entry, Instr, LabelDef, OpInstr, Param, Script, SymbolTable,
};
use crate::archive::defaults::DEFAULTVAL;
use crate::context::Context;
use crate::formats::{EntryHeader, Sprite, ThtxHeader};
use crate::opcodes;
use crate::value::{ParamKind, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f32),
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    AttrOpen,
    AttrClose,
    Colon,
    Comma,
    Semicolon,
    Dollar,
    Percent,
    Plus,
    Equals,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier `{s}`"),
            Token::Int(v) => format!("number {v}"),
            Token::Float(v) => format!("number {v}"),
            Token::Str(s) => format!("string \"{s}\""),
            Token::LBrace => "`{`".into(),
            Token::RBrace => "`}`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::LBracket => "`[`".into(),
            Token::RBracket => "`]`".into(),
            Token::AttrOpen => "`[[`".into(),
            Token::AttrClose => "`]]`".into(),
            Token::Colon => "`:`".into(),
            Token::Comma => "`,`".into(),
            Token::Semicolon => "`;`".into(),
            Token::Dollar => "`$`".into(),
            Token::Percent => "`%`".into(),
            Token::Plus => "`+`".into(),
            Token::Equals => "`=`".into(),
        }
    }
}

fn lex(src: &str) -> Result<Vec<(Token, u32)>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            '\n' => {
                line += 1;
                pos += 1;
            }
            _ if c.is_whitespace() => pos += 1,
            '/' if chars.get(pos + 1) == Some(&'/') => {
                while pos < chars.len() && chars[pos] != '\n' {
                    pos += 1;
                }
            }
            '/' if chars.get(pos + 1) == Some(&'*') => {
                pos += 2;
                loop {
                    match chars.get(pos) {
                        None => bail!("line {line}: unterminated block comment"),
                        Some('\n') => line += 1,
                        Some('*') if chars.get(pos + 1) == Some(&'/') => {
                            pos += 2;
                            break;
                        }
                        Some(_) => {}
                    }
                    pos += 1;
                }
            }
            '"' => {
                pos += 1;
                let mut s = String::new();
                loop {
                    match chars.get(pos) {
                        None | Some('\n') => bail!("line {line}: unterminated string"),
                        Some('"') => {
                            pos += 1;
                            break;
                        }
                        Some('\\') => {
                            pos += 1;
                            match chars.get(pos) {
                                Some('n') => s.push('\n'),
                                Some('t') => s.push('\t'),
                                Some(&e) => s.push(e),
                                None => bail!("line {line}: unterminated string"),
                            }
                            pos += 1;
                        }
                        Some(&e) => {
                            s.push(e);
                            pos += 1;
                        }
                    }
                }
                tokens.push((Token::Str(s), line));
            }
            '[' if chars.get(pos + 1) == Some(&'[') => {
                tokens.push((Token::AttrOpen, line));
                pos += 2;
            }
            ']' if chars.get(pos + 1) == Some(&']') => {
                tokens.push((Token::AttrClose, line));
                pos += 2;
            }
            '[' => {
                tokens.push((Token::LBracket, line));
                pos += 1;
            }
            ']' => {
                tokens.push((Token::RBracket, line));
                pos += 1;
            }
            '{' => {
                tokens.push((Token::LBrace, line));
                pos += 1;
            }
            '}' => {
                tokens.push((Token::RBrace, line));
                pos += 1;
            }
            '(' => {
                tokens.push((Token::LParen, line));
                pos += 1;
            }
            ')' => {
                tokens.push((Token::RParen, line));
                pos += 1;
            }
            ':' => {
                tokens.push((Token::Colon, line));
                pos += 1;
            }
            ',' => {
                tokens.push((Token::Comma, line));
                pos += 1;
            }
            ';' => {
                tokens.push((Token::Semicolon, line));
                pos += 1;
            }
            '$' => {
                tokens.push((Token::Dollar, line));
                pos += 1;
            }
            '%' => {
                tokens.push((Token::Percent, line));
                pos += 1;
            }
            '+' => {
                tokens.push((Token::Plus, line));
                pos += 1;
            }
            '=' => {
                tokens.push((Token::Equals, line));
                pos += 1;
            }
            '-' | '0'..='9' | '.' => {
                let start = pos;
                if c == '-' {
                    pos += 1;
                    if !matches!(chars.get(pos), Some('0'..='9' | '.')) {
                        bail!("line {line}: stray `-`");
                    }
                }
                if chars.get(pos) == Some(&'0')
                    && matches!(chars.get(pos + 1), Some('x' | 'X'))
                {
                    pos += 2;
                    let digits_start = pos;
                    while matches!(chars.get(pos), Some(d) if d.is_ascii_hexdigit()) {
                        pos += 1;
                    }
                    if digits_start == pos {
                        bail!("line {line}: malformed hex literal");
                    }
                    let digits: String = chars[digits_start..pos].iter().collect();
                    let mut value = i64::from_str_radix(&digits, 16)
                        .with_context(|| format!("line {line}: bad hex literal"))?;
                    if chars[start] == '-' {
                        value = -value;
                    }
                    tokens.push((Token::Int(value), line));
                    continue;
                }

                let mut is_float = false;
                while matches!(chars.get(pos), Some('0'..='9')) {
                    pos += 1;
                }
                if chars.get(pos) == Some(&'.') {
                    is_float = true;
                    pos += 1;
                    while matches!(chars.get(pos), Some('0'..='9')) {
                        pos += 1;
                    }
                }
                if matches!(chars.get(pos), Some('e' | 'E')) {
                    is_float = true;
                    pos += 1;
                    if matches!(chars.get(pos), Some('+' | '-')) {
                        pos += 1;
                    }
                    while matches!(chars.get(pos), Some('0'..='9')) {
                        pos += 1;
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                if chars.get(pos) == Some(&'f') {
                    is_float = true;
                    pos += 1;
                }
                if is_float {
                    let value: f32 = text
                        .parse()
                        .with_context(|| format!("line {line}: bad float literal `{text}`"))?;
                    tokens.push((Token::Float(value), line));
                } else {
                    let value: i64 = text
                        .parse()
                        .with_context(|| format!("line {line}: bad integer literal `{text}`"))?;
                    tokens.push((Token::Int(value), line));
                }
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while matches!(chars.get(pos), Some(d) if d.is_ascii_alphanumeric() || *d == '_') {
                    pos += 1;
                }
                tokens.push((Token::Ident(chars[start..pos].iter().collect()), line));
            }
            _ => bail!("line {line}: unexpected character {c:?}"),
        }
    }
    Ok(tokens)
}

/// A raw instruction argument before it is typed against a format string.
#[derive(Debug, Clone)]
enum Arg {
    Int(i64),
    Float(f32),
    Ident(String),
    NamedVar { float: bool, name: String },
    RawVarInt(i64),
    RawVarFloat(f32),
}

#[derive(Debug, Clone, Copy)]
enum GlobalValue {
    Int(i64),
    Float(f32),
}

/// Everything a spec file compiles into.
pub struct ParseOutput {
    pub archive: Archive,
    pub symbols: SymbolTable,
}

pub fn parse_spec(src: &str, game: u32, ctx: &Context) -> Result<ParseOutput> {
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        game,
        ctx,
        entries: Vec::new(),
        symbols: SymbolTable::new(),
        globals: HashMap::new(),
        sprite_id: 0,
        script_id: 0,
        script_real_index: 0,
    };
    parser.run()?;
    Ok(ParseOutput {
        archive: Archive {
            entries: parser.entries,
        },
        symbols: parser.symbols,
    })
}

struct Parser<'a> {
    tokens: Vec<(Token, u32)>,
    pos: usize,
    game: u32,
    ctx: &'a Context,
    entries: Vec<Entry>,
    symbols: SymbolTable,
    globals: HashMap<String, GlobalValue>,
    sprite_id: i32,
    script_id: i32,
    script_real_index: i32,
}

/// Collected entry fields, staged until the block closes.
#[derive(Default)]
struct EntryFields {
    version: Option<i64>,
    name: Option<String>,
    filename: Option<String>,
    name2: Option<String>,
    format: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    x_offset: Option<i64>,
    y_offset: Option<i64>,
    colorkey: Option<i64>,
    memory_priority: Option<i64>,
    low_res_scale: Option<i64>,
    jpeg_quality: Option<i64>,
    has_data: Option<i64>,
    thtx_size: Option<i64>,
    thtx_format: Option<i64>,
    thtx_width: Option<i64>,
    thtx_height: Option<i64>,
    thtx_zero: Option<i64>,
    w_max: Option<i64>,
    h_max: Option<i64>,
}

fn to_u32(line: u32, key: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| anyhow::anyhow!("line {line}: {key} value {value} out of range"))
}

fn to_i32(line: u32, value: i64) -> Result<i32> {
    if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        Ok(value as i32)
    } else {
        bail!("line {line}: integer {value} out of range")
    }
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Result<(Token, u32)> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .with_context(|| "unexpected end of file")?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, want: &Token) -> Result<u32> {
        let (token, line) = self.next()?;
        if token == *want {
            Ok(line)
        } else {
            bail!(
                "line {line}: expected {}, found {}",
                want.describe(),
                token.describe()
            )
        }
    }

    fn expect_ident(&mut self) -> Result<(String, u32)> {
        match self.next()? {
            (Token::Ident(s), line) => Ok((s, line)),
            (other, line) => bail!("line {line}: expected identifier, found {}", other.describe()),
        }
    }

    fn expect_int(&mut self) -> Result<(i64, u32)> {
        match self.next()? {
            (Token::Int(v), line) => Ok((v, line)),
            (other, line) => bail!("line {line}: expected integer, found {}", other.describe()),
        }
    }

    fn expect_string(&mut self, key: &str) -> Result<(String, u32)> {
        match self.next()? {
            (Token::Str(s), line) => Ok((s, line)),
            (other, line) => bail!(
                "line {line}: {key} expects a string, found {}",
                other.describe()
            ),
        }
    }

    fn eat(&mut self, want: &Token) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn run(&mut self) -> Result<()> {
        while self.peek().is_some() {
            let (word, line) = self.expect_ident()?;
            match word.as_str() {
                "entry" => self.parse_entry()?,
                "script" => self.parse_script()?,
                "global" => self.parse_global()?,
                other => bail!("line {line}: expected `entry`, `script` or `global`, found `{other}`"),
            }
        }
        if self.entries.is_empty() {
            bail!("spec file defines no entries");
        }
        Ok(())
    }

    fn parse_global(&mut self) -> Result<()> {
        let (name, line) = self.expect_ident()?;
        self.expect(&Token::Equals)?;
        let value = match self.next()? {
            (Token::Int(v), _) => GlobalValue::Int(v),
            (Token::Float(v), _) => GlobalValue::Float(v),
            (other, line) => bail!(
                "line {line}: global value must be a number, found {}",
                other.describe()
            ),
        };
        self.expect(&Token::Semicolon)?;
        if self.globals.insert(name.clone(), value).is_some() {
            bail!("line {line}: global `{name}` redefined");
        }
        Ok(())
    }

    fn parse_entry(&mut self) -> Result<()> {
        // The block's own identifier (entry0, entry1, ...) is decorative.
        let (_, _) = self.expect_ident()?;
        let open_line = self.expect(&Token::LBrace)?;

        let mut fields = EntryFields::default();
        let mut sprites = Vec::new();
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            let (key, _) = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            if key == "sprites" {
                sprites = self.parse_sprites()?;
            } else {
                self.parse_entry_field(&mut fields, &key)?;
            }
            self.eat(&Token::Comma);
        }

        let version_value = fields
            .version
            .with_context(|| format!("line {open_line}: entry is missing `version`"))?;
        if !matches!(version_value, 0 | 2 | 3 | 4 | 7 | 8) {
            bail!("line {open_line}: unsupported entry version {version_value}");
        }
        let name = fields
            .name
            .with_context(|| format!("line {open_line}: entry is missing `name`"))?;
        let has_data = fields.has_data.unwrap_or(0);
        if !matches!(has_data, 0 | 1) {
            bail!("line {open_line}: hasData must be 0 or 1");
        }

        let field_u32 = |key: &str, v: Option<i64>, default: u32| -> Result<u32> {
            v.map_or(Ok(default), |v| to_u32(open_line, key, v))
        };

        let header = EntryHeader {
            version: version_value as u32,
            format: field_u32("format", fields.format, 0)?,
            w: field_u32("width", fields.width, DEFAULTVAL)?,
            h: field_u32("height", fields.height, DEFAULTVAL)?,
            x: field_u32("xOffset", fields.x_offset, 0)?,
            y: field_u32("yOffset", fields.y_offset, 0)?,
            colorkey: field_u32("colorKey", fields.colorkey, 0)?,
            memory_priority: field_u32("memoryPriority", fields.memory_priority, 0)?,
            low_res_scale: field_u32("lowResScale", fields.low_res_scale, 0)? as u8,
            jpeg_quality: field_u32("jpeg_quality", fields.jpeg_quality, 0)? as u8,
            has_data: has_data as u16,
            w_max: field_u32("w_max", fields.w_max, 0)? as u16,
            h_max: field_u32("h_max", fields.h_max, 0)? as u16,
            ..Default::default()
        };

        let thtx = if has_data == 1 {
            Some(ThtxHeader {
                format: field_u32("THTXFormat", fields.thtx_format, DEFAULTVAL)?,
                w: field_u32("THTXWidth", fields.thtx_width, DEFAULTVAL)?,
                h: field_u32("THTXHeight", fields.thtx_height, DEFAULTVAL)?,
                size: field_u32("THTXSize", fields.thtx_size, DEFAULTVAL)?,
                zero: field_u32("THTXZero", fields.thtx_zero, 0)?,
            })
        } else {
            None
        };

        self.entries.push(Entry {
            header,
            name,
            name2: fields.name2,
            filename: fields.filename,
            sprites,
            scripts: Vec::new(),
            thtx,
            data: None,
            base_offset: 0,
        });
        Ok(())
    }

    fn parse_entry_field(&mut self, fields: &mut EntryFields, key: &str) -> Result<()> {
        match key {
            "name" => fields.name = Some(self.expect_string(key)?.0),
            "filename" => fields.filename = Some(self.expect_string(key)?.0),
            "name2" => fields.name2 = Some(self.expect_string(key)?.0),
            _ => {
                let (value, line) = self.expect_int()?;
                let slot = match key {
                    "version" => &mut fields.version,
                    "format" => &mut fields.format,
                    "width" => &mut fields.width,
                    "height" => &mut fields.height,
                    "xOffset" => &mut fields.x_offset,
                    "yOffset" => &mut fields.y_offset,
                    "colorKey" => &mut fields.colorkey,
                    "memoryPriority" => &mut fields.memory_priority,
                    "lowResScale" => &mut fields.low_res_scale,
                    "jpeg_quality" => &mut fields.jpeg_quality,
                    "hasData" => &mut fields.has_data,
                    "THTXSize" => &mut fields.thtx_size,
                    "THTXFormat" => &mut fields.thtx_format,
                    "THTXWidth" => &mut fields.thtx_width,
                    "THTXHeight" => &mut fields.thtx_height,
                    "THTXZero" => &mut fields.thtx_zero,
                    "w_max" => &mut fields.w_max,
                    "h_max" => &mut fields.h_max,
                    other => bail!("line {line}: unknown entry field `{other}`"),
                };
                *slot = Some(value);
            }
        }
        Ok(())
    }

    fn parse_sprites(&mut self) -> Result<Vec<Sprite>> {
        self.expect(&Token::LBrace)?;
        let mut sprites = Vec::new();
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            let (name, line) = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            self.expect(&Token::LBrace)?;

            let mut x = 0.0f32;
            let mut y = 0.0f32;
            let mut w = 0.0f32;
            let mut h = 0.0f32;
            let mut id: Option<i64> = None;
            let mut unk = Sprite::UNK_DEFAULTS;
            loop {
                if self.eat(&Token::RBrace) {
                    break;
                }
                let (key, line) = self.expect_ident()?;
                self.expect(&Token::Colon)?;
                if key == "id" {
                    id = Some(self.expect_int()?.0);
                } else {
                    let value = match self.next()? {
                        (Token::Int(v), _) => v as f32,
                        (Token::Float(v), _) => v,
                        (other, line) => bail!(
                            "line {line}: sprite field {key} expects a number, found {}",
                            other.describe()
                        ),
                    };
                    match key.as_str() {
                        "x" => x = value,
                        "y" => y = value,
                        "w" => w = value,
                        "h" => h = value,
                        "th19_unk0" => unk[0] = value,
                        "th19_unk1" => unk[1] = value,
                        "th19_unk2" => unk[2] = value,
                        "th19_unk3" => unk[3] = value,
                        "th19_unk4" => unk[4] = value,
                        other => bail!("line {line}: unknown sprite field `{other}`"),
                    }
                }
                self.eat(&Token::Comma);
            }
            self.eat(&Token::Comma);

            let id = match id {
                Some(v) => to_i32(line, v)?,
                None => self.sprite_id,
            };
            self.sprite_id = id + 1;
            if !self.symbols.define_sprite(&name, id) {
                bail!("line {line}: sprite `{name}` already defined");
            }
            let mut sprite = Sprite::new(id as u32, x, y, w, h);
            sprite.unk = unk;
            sprites.push(sprite);
        }
        Ok(sprites)
    }

    fn parse_script(&mut self) -> Result<()> {
        let mut no_sentinel = false;
        if self.eat(&Token::AttrOpen) {
            let (attr, line) = self.expect_ident()?;
            if attr != "no_sentinel" {
                bail!("line {line}: unknown script attribute `{attr}`");
            }
            self.expect(&Token::AttrClose)?;
            no_sentinel = true;
        }

        let explicit_id = if let Some(Token::Int(_)) = self.peek() {
            Some(self.expect_int()?)
        } else {
            None
        };
        let (name, line) = self.expect_ident()?;

        if self.entries.is_empty() {
            bail!("line {line}: script `{name}` appears before any entry");
        }
        let entry_version = self.entries.last().unwrap().header.version;

        let id = match explicit_id {
            Some((v, line)) => to_i32(line, v)?,
            None => self.script_id,
        };
        self.script_id = id + 1;
        let real_index = self.script_real_index;
        self.script_real_index += 1;
        if !self.symbols.define_script(&name, real_index) {
            bail!("line {line}: script `{name}` already defined");
        }

        self.expect(&Token::LBrace)?;
        let mut instrs: Vec<Instr> = Vec::new();
        let mut labels: Vec<LabelDef> = Vec::new();
        let mut time: i32 = 0;
        let mut offset: u32 = 0;
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            match self.next()? {
                (Token::Plus, _) => {
                    let (delta, _) = self.expect_int()?;
                    self.expect(&Token::Colon)?;
                    time += delta as i32;
                }
                (Token::Int(abs), _) => {
                    self.expect(&Token::Colon)?;
                    time = abs as i32;
                }
                (Token::Ident(word), line) => {
                    if self.eat(&Token::Colon) {
                        if labels.iter().any(|l| l.name == word) {
                            bail!("line {line}: label `{word}` already defined");
                        }
                        labels.push(LabelDef {
                            name: word,
                            offset,
                            time,
                        });
                    } else if self.peek() == Some(&Token::LParen) {
                        self.expect(&Token::LParen)?;
                        let instr =
                            self.parse_instruction(&word, entry_version, time, &mut offset, line)?;
                        instrs.push(Instr::Op(instr));
                    } else {
                        bail!("line {line}: expected `:` or `(` after `{word}`");
                    }
                }
                (other, line) => bail!(
                    "line {line}: expected an instruction, label or time marker, found {}",
                    other.describe()
                ),
            }
        }

        self.entries.last_mut().unwrap().scripts.push(Script {
            real_index,
            id,
            offset: 0,
            no_sentinel,
            instrs,
            labels,
        });
        Ok(())
    }

    fn parse_instruction(
        &mut self,
        mnemonic: &str,
        entry_version: u32,
        time: i32,
        offset: &mut u32,
        line: u32,
    ) -> Result<OpInstr> {
        let opcode = match mnemonic.strip_prefix("ins_").and_then(|s| s.parse::<u16>().ok()) {
            Some(id) => id,
            None => match self.ctx.map.ins_ids.get(mnemonic) {
                Some(&id) => u16::try_from(id)
                    .map_err(|_| anyhow::anyhow!("line {line}: opcode id {id} out of range"))?,
                None => bail!("line {line}: unknown mnemonic `{mnemonic}`"),
            },
        };

        let mut args = Vec::new();
        loop {
            if self.eat(&Token::RParen) {
                break;
            }
            if !args.is_empty() {
                self.expect(&Token::Comma)?;
            }
            args.push(self.parse_arg()?);
        }
        self.expect(&Token::Semicolon)?;

        let format = opcodes::find_format(self.game, entry_version, opcode);
        let params = match format {
            Some(fmt) => {
                let kinds: Vec<ParamKind> = fmt
                    .chars()
                    .map(|c| ParamKind::from_format_char(c).expect("format tables are well-formed"))
                    .collect();
                if args.len() != kinds.len() {
                    bail!(
                        "line {line}: ins_{opcode} expects {} argument(s), found {}",
                        kinds.len(),
                        args.len()
                    );
                }
                kinds
                    .into_iter()
                    .zip(args)
                    .map(|(kind, arg)| self.make_param(kind, arg, line))
                    .collect::<Result<Vec<_>>>()?
            }
            None => {
                tracing::warn!(
                    opcode,
                    "opcode not found in the format table, inferring parameter types"
                );
                args.into_iter()
                    .map(|arg| self.make_untyped_param(arg, line))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let kinds: Vec<ParamKind> = params.iter().map(|p| p.kind).collect();
        let size = OpInstr::compute_size(entry_version, &kinds);
        let instr = OpInstr {
            opcode,
            time: time as i16,
            offset: *offset,
            size,
            param_mask: 0,
            params,
            address: 0,
        };
        *offset += size;
        Ok(instr)
    }

    fn parse_arg(&mut self) -> Result<Arg> {
        match self.next()? {
            (Token::Int(v), _) => Ok(Arg::Int(v)),
            (Token::Float(v), _) => Ok(Arg::Float(v)),
            (Token::Ident(s), _) => Ok(Arg::Ident(s)),
            (Token::Dollar, _) => {
                let (name, _) = self.expect_ident()?;
                Ok(Arg::NamedVar { float: false, name })
            }
            (Token::Percent, _) => {
                let (name, _) = self.expect_ident()?;
                Ok(Arg::NamedVar { float: true, name })
            }
            (Token::LBracket, _) => {
                let value = match self.next()? {
                    (Token::Int(v), _) => Arg::RawVarInt(v),
                    (Token::Float(v), _) => Arg::RawVarFloat(v),
                    (other, line) => bail!(
                        "line {line}: variable id must be a number, found {}",
                        other.describe()
                    ),
                };
                self.expect(&Token::RBracket)?;
                Ok(value)
            }
            (other, line) => bail!(
                "line {line}: expected an argument, found {}",
                other.describe()
            ),
        }
    }

    fn make_param(&self, kind: ParamKind, arg: Arg, line: u32) -> Result<Param> {
        let reference = matches!(
            kind,
            ParamKind::Offset | ParamKind::Time | ParamKind::SpriteRef | ParamKind::ScriptRef
        );
        let param = match arg {
            Arg::NamedVar { float, name } => {
                let reg = self
                    .ctx
                    .map
                    .gvar_ids
                    .get(&name)
                    .with_context(|| format!("line {line}: unknown variable `{name}`"))?;
                let value = if float {
                    Value::Float(*reg as f32)
                } else {
                    Value::Int(*reg)
                };
                Param {
                    kind,
                    is_var: true,
                    value,
                }
            }
            Arg::RawVarInt(v) => {
                let value = match kind {
                    ParamKind::Float => Value::Float(v as f32),
                    ParamKind::Short => Value::Short(
                        i16::try_from(v)
                            .map_err(|_| anyhow::anyhow!("line {line}: {v} out of 16-bit range"))?,
                    ),
                    _ => Value::Int(to_i32(line, v)?),
                };
                Param {
                    kind,
                    is_var: true,
                    value,
                }
            }
            Arg::RawVarFloat(v) => Param {
                kind,
                is_var: true,
                value: Value::Float(v),
            },
            Arg::Int(v) => {
                let value = match kind {
                    ParamKind::Float => Value::Float(v as f32),
                    ParamKind::Short => Value::Short(
                        i16::try_from(v)
                            .map_err(|_| anyhow::anyhow!("line {line}: {v} out of 16-bit range"))?,
                    ),
                    _ => Value::Int(to_i32(line, v)?),
                };
                Param::new(kind, value)
            }
            Arg::Float(v) => {
                if kind != ParamKind::Float {
                    bail!(
                        "line {line}: float literal in a {:?} slot",
                        kind.format_char()
                    );
                }
                Param::new(kind, Value::Float(v))
            }
            Arg::Ident(name) => {
                if reference {
                    Param::new(kind, Value::Name(name))
                } else {
                    match self.globals.get(&name) {
                        Some(GlobalValue::Int(v)) => {
                            return self.make_param(kind, Arg::Int(*v), line);
                        }
                        Some(GlobalValue::Float(v)) => {
                            return self.make_param(kind, Arg::Float(*v), line);
                        }
                        None => bail!("line {line}: unknown identifier `{name}`"),
                    }
                }
            }
        };
        Ok(param)
    }

    /// Without a format string, parameter kinds are inferred from the
    /// literals themselves.
    fn make_untyped_param(&self, arg: Arg, line: u32) -> Result<Param> {
        match arg {
            Arg::Int(v) => Ok(Param::new(ParamKind::Int, Value::Int(to_i32(line, v)?))),
            Arg::Float(v) => Ok(Param::new(ParamKind::Float, Value::Float(v))),
            Arg::RawVarInt(v) => Ok(Param {
                kind: ParamKind::Int,
                is_var: true,
                value: Value::Int(to_i32(line, v)?),
            }),
            Arg::RawVarFloat(v) => Ok(Param {
                kind: ParamKind::Float,
                is_var: true,
                value: Value::Float(v),
            }),
            Arg::NamedVar { float, name } => {
                let reg = self
                    .ctx
                    .map
                    .gvar_ids
                    .get(&name)
                    .with_context(|| format!("line {line}: unknown variable `{name}`"))?;
                Ok(Param {
                    kind: if float { ParamKind::Float } else { ParamKind::Int },
                    is_var: true,
                    value: if float {
                        Value::Float(*reg as f32)
                    } else {
                        Value::Int(*reg)
                    },
                })
            }
            Arg::Ident(name) => {
                bail!("line {line}: cannot type `{name}` for an unknown opcode")
            }
        }
    }
}
