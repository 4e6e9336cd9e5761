//! Recursive-descent parser for native signature declarations.
//!
//! ## Grammar
//!
//! ```text
//! function    := ['static'] ['virtual'] type NAME '(' params ')' ['const']
//! initializer := params
//! field       := type NAME
//! params      := [param (',' param)*] | 'void'
//! param       := type NAME ['=' default]
//! type        := ['const'] NAME ['<' type '>'] ['const'] ('*' | '&' | '*' '&')?
//! ```
//!
//! `*&` parameters are out-parameters unless their options mark them as
//! input. Out-parameters become returns and do not take a managed position.

use kernelbind_core::{
    ArgSpec, FieldSpec, FunctionSpec, OverloadSpec, ParseError, ParseErrorKind, ReturnKind, Span,
};

use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::{FunctionOptions, ParamOptions};
use crate::types::{ContainerKind, Indirection, TypeRef, TypeTable};

/// Native name of the kernel result-code type.
const RESULT_TYPE: &str = "MbResultType";

/// Name given to an unnamed primary return.
const DEFAULT_RETURN_NAME: &str = "_result";

/// A parameter before classification into argument or out-parameter.
#[derive(Debug, Clone)]
struct RawParam {
    ty: TypeRef,
    name: String,
    default: Option<String>,
}

struct DeclParser<'src, 't> {
    lexer: Lexer<'src>,
    source: &'src str,
    types: &'t TypeTable,
}

impl<'src, 't> DeclParser<'src, 't> {
    fn new(source: &'src str, types: &'t TypeTable) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
            types,
        }
    }

    // =========================================
    // Token helpers
    // =========================================

    fn peek(&mut self) -> Result<Token<'src>, ParseError> {
        self.lexer.peek()
    }

    fn advance(&mut self) -> Result<Token<'src>, ParseError> {
        self.lexer.next_token()
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.peek()?.is(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        let token = self.advance()?;
        if token.is(kind) {
            return Ok(token);
        }
        let error_kind = if token.is(TokenKind::Eof) {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        Err(ParseError::new(
            error_kind,
            token.span,
            format!("expected {}, found {}", kind.describe(), token.kind.describe()),
        ))
    }

    fn expect_name(&mut self) -> Result<Token<'src>, ParseError> {
        let token = self.advance()?;
        if token.is(TokenKind::Identifier) {
            return Ok(token);
        }
        Err(ParseError::new(
            ParseErrorKind::ExpectedIdentifier,
            token.span,
            format!("found {}", token.kind.describe()),
        ))
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        let token = self.peek()?;
        if token.is(TokenKind::Eof) {
            return Ok(());
        }
        Err(ParseError::new(
            ParseErrorKind::UnexpectedToken,
            token.span,
            format!("trailing {}", token.kind.describe()),
        ))
    }

    // =========================================
    // Types
    // =========================================

    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let is_const = self.eat(TokenKind::Const)?;
        let name = self.advance()?;
        if !name.is(TokenKind::Identifier) {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedType,
                name.span,
                format!("found {}", name.kind.describe()),
            ));
        }

        let mut span = name.span;
        let element = if self.peek()?.is(TokenKind::Less) {
            let open = self.advance()?;
            let element = self.parse_type()?;
            let close = self.advance()?;
            if !close.is(TokenKind::Greater) {
                return Err(ParseError::new(
                    ParseErrorKind::UnterminatedTemplate,
                    open.span.merge(close.span),
                    format!("'{}<' closed by {}", name.lexeme, close.kind.describe()),
                ));
            }
            span = span.merge(close.span);
            Some(Box::new(element))
        } else {
            None
        };

        // `MbCurve const *`
        let is_const = self.eat(TokenKind::Const)? || is_const;
        let indirection = self.parse_indirection()?;

        Ok(TypeRef {
            name: name.lexeme.to_string(),
            is_const,
            element,
            indirection,
            span,
        })
    }

    fn parse_indirection(&mut self) -> Result<Indirection, ParseError> {
        if self.eat(TokenKind::Star)? {
            if self.eat(TokenKind::Amp)? {
                return Ok(Indirection::PointerRef);
            }
            return Ok(Indirection::Pointer);
        }
        if self.eat(TokenKind::Amp)? {
            return Ok(Indirection::Reference);
        }
        Ok(Indirection::None)
    }

    // =========================================
    // Parameters
    // =========================================

    fn parse_param(&mut self) -> Result<RawParam, ParseError> {
        let ty = self.parse_type()?;
        let name = self.expect_name()?;
        let default = if self.eat(TokenKind::Equal)? {
            Some(self.parse_default()?)
        } else {
            None
        };
        Ok(RawParam {
            ty,
            name: name.lexeme.to_string(),
            default,
        })
    }

    /// Read a default expression up to the next top-level `,` or `)`.
    fn parse_default(&mut self) -> Result<String, ParseError> {
        let mut depth = 0usize;
        let mut span: Option<Span> = None;
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::RightParen if depth == 0 => break,
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                _ => {}
            }
            self.advance()?;
            span = Some(span.map_or(token.span, |s| s.merge(token.span)));
        }

        match span {
            Some(span) => Ok(self.source[span.start as usize..span.end() as usize].to_string()),
            None => {
                let at = self.peek()?.span;
                Err(ParseError::new(
                    ParseErrorKind::InvalidDefault,
                    at,
                    "missing value after '='",
                ))
            }
        }
    }

    /// Parameters until `terminator` (not consumed).
    fn parse_params(&mut self, terminator: TokenKind) -> Result<Vec<RawParam>, ParseError> {
        let mut params = Vec::new();
        if self.peek()?.is(terminator) {
            return Ok(params);
        }
        // `Foo(void)`
        if self.peek()?.lexeme == "void" && self.lexer.peek_nth(1)?.is(terminator) {
            self.advance()?;
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if !self.eat(TokenKind::Comma)? {
                return Ok(params);
            }
        }
    }

    // =========================================
    // Argument construction
    // =========================================

    fn build_arg(&self, ty: &TypeRef, name: &str, position: usize) -> Result<ArgSpec, ParseError> {
        let resolved = self.types.resolve(ty)?;
        let mut arg = ArgSpec::new(name, ty.name.as_str(), resolved.managed, position)
            .with_pass_by(ty.indirection.pass_by());
        if ty.is_const {
            arg = arg.with_const();
        }
        if let (Some(container), Some((native, managed))) = (resolved.container, resolved.element) {
            arg = arg.with_element(ArgSpec::element(native, managed, container.element_pass_by()));
            if container == ContainerKind::Iterator {
                arg = arg.iterator_adapter();
            }
        }
        Ok(arg)
    }

    /// Split raw parameters into managed arguments and out-parameters.
    fn build_params(
        &self,
        raw: Vec<RawParam>,
        options: &FunctionOptions,
    ) -> Result<(Vec<ArgSpec>, Vec<ArgSpec>), ParseError> {
        let mut params = Vec::new();
        let mut outs = Vec::new();
        let none = ParamOptions::default();

        for (slot, mut param) in raw.into_iter().enumerate() {
            let opts = options.param(&param.name).unwrap_or(&none);
            let is_out = match param.ty.indirection {
                Indirection::PointerRef if opts.is_input => {
                    param.ty.indirection = Indirection::Pointer;
                    false
                }
                Indirection::PointerRef => true,
                _ => opts.is_return,
            };

            if is_out {
                let arg = self
                    .build_arg(&param.ty, &param.name, outs.len())?
                    .with_native_slot(slot);
                outs.push(arg);
                continue;
            }

            let mut arg = self
                .build_arg(&param.ty, &param.name, params.len())?
                .with_native_slot(slot);
            if let Some(default) = param.default {
                arg = arg.with_default(default);
            }
            if opts.is_nullable {
                arg = arg.nullable();
            }
            if opts.is_owning {
                arg = arg.owning_pointer();
            }
            params.push(arg);
        }
        Ok((params, outs))
    }
}

// =========================================
// Entry points
// =========================================

/// Parse `<ret> [Class::]Name(<params>)` into a single-overload function.
pub fn parse_function(
    decl: &str,
    options: &FunctionOptions,
    types: &TypeTable,
) -> Result<FunctionSpec, ParseError> {
    let mut parser = DeclParser::new(decl, types);

    let is_static = parser.eat(TokenKind::Static)? || options.is_static;
    parser.eat(TokenKind::Virtual)?;

    let ret = parser.parse_type()?;
    let name = parser.expect_name()?;
    parser.expect(TokenKind::LeftParen)?;
    let raw = parser.parse_params(TokenKind::RightParen)?;
    parser.expect(TokenKind::RightParen)?;
    parser.eat(TokenKind::Const)?;
    parser.expect_end()?;

    let native_name = name.lexeme.rsplit("::").next().unwrap_or(name.lexeme);
    let (params, outs) = parser.build_params(raw, options)?;

    let ret_opts = &options.return_options;
    let return_kind = if ret.name == RESULT_TYPE {
        ReturnKind::ErrorCode
    } else if ret_opts.is_error_bool {
        ReturnKind::ErrorBool
    } else if ret_opts.ignore || (ret.name == "void" && ret.indirection == Indirection::None) {
        ReturnKind::Void
    } else {
        ReturnKind::Value
    };

    let mut returns = Vec::with_capacity(outs.len() + 1);
    if return_kind == ReturnKind::Value {
        let ret_name = ret_opts.name.as_deref().unwrap_or(DEFAULT_RETURN_NAME);
        let on_stack = ret_opts
            .is_on_stack
            .unwrap_or(ret.indirection != Indirection::Pointer);
        returns.push(parser.build_arg(&ret, ret_name, 0)?.on_stack(on_stack));
    }
    let offset = returns.len();
    returns.extend(outs.into_iter().map(|mut out| {
        out.position += offset;
        out
    }));

    let overload = OverloadSpec {
        params,
        returns,
        return_kind,
    };

    let mut function = FunctionSpec::new(native_name, overload);
    if let Some(managed) = &options.managed_name {
        function = function.with_managed_name(managed.as_str());
    }
    function.is_static = is_static;
    function.is_manual = options.is_manual;
    function.is_uninheritable = options.is_uninheritable;

    log::trace!(
        "parsed {}: {} params, {} returns, {:?}",
        function.name,
        function.overloads[0].params.len(),
        function.overloads[0].returns.len(),
        return_kind
    );
    Ok(function)
}

/// Parse a bare parameter list into a constructor overload.
pub fn parse_initializer(decl: &str, types: &TypeTable) -> Result<OverloadSpec, ParseError> {
    let mut parser = DeclParser::new(decl, types);
    let raw = parser.parse_params(TokenKind::Eof)?;
    parser.expect_end()?;
    let (params, _) = parser.build_params(raw, &FunctionOptions::default())?;
    Ok(OverloadSpec::new(params))
}

/// Parse `<type> <name>` into a field accessor descriptor.
pub fn parse_field(decl: &str, types: &TypeTable) -> Result<FieldSpec, ParseError> {
    let mut parser = DeclParser::new(decl, types);
    let ty = parser.parse_type()?;
    let name = parser.expect_name()?;
    parser.expect_end()?;
    let on_stack = ty.indirection != Indirection::Pointer;
    let arg = parser.build_arg(&ty, name.lexeme, 0)?.on_stack(on_stack);
    let mut field = FieldSpec::new(arg);
    // `const` members get a getter only.
    field.read_only = ty.is_const;
    Ok(field)
}
