/*!

# rebex - an EcmaScript regex engine compiling to compact bytecode

This crate provides a regular expression engine which targets EcmaScript (aka
JavaScript) regular expression syntax. Patterns are compiled to a compact,
position-independent bytecode which is then executed by a classical
backtracking interpreter.

# Example: test if a string contains a match

```rust
use rebex::Regex;
let re = Regex::new(r"\d{4}").unwrap();
let matched = re.find("2020-20-05").is_some();
assert!(matched);
```

# Example: iterating over matches

Here we use a backreference to find doubled characters:

```rust
use rebex::Regex;
let re = Regex::new(r"(\w)\1").unwrap();
let text = "Frankly, Miss Piggy, I don't give a hoot!";
for m in re.find_iter(text) {
    println!("{}", &text[m.range])
}
// Output: ss
// Output: gg
// Output: oo

```

# Example: using capture groups

Capture groups are available in the `Match` object produced by a successful
match. A capture group is a range of indexes into the original string.

```rust
use rebex::Regex;
let re = Regex::new(r"(\d{4})").unwrap();
let text = "Today is 2020-20-05";
let m = re.find(text).unwrap();
let group = m.group(1).unwrap();
println!("Year: {}", &text[group]);
// Output: Year: 2020
```

# Supported Syntax

rebex targets ES 2018 syntax, including the Annex B "web compatibility"
extensions in non-unicode mode: legacy octal escapes, identity escapes, and
unbalanced braces and brackets as literals. Patterns compiled without the `u`
flag treat the input as a sequence of individual code units; with `u`,
surrogate pairs in UTF-16 input decode to single code points and case folding
uses the Unicode simple fold mappings.

Not yet implemented:

- Unicode property escapes like `\p{Sc}`

# String encodings

Matching is generic over the input representation. The `&str` entry points
match per byte, which is exact for ASCII text. The `_utf16` entry points
accept `&[u16]` directly, which is useful when interacting with systems that
use that encoding, such as JavaScript engines, Windows, and the JVM.

rebex does NOT perform normalization: e-with-acute-accent can be precomposed
or decomposed, and these are treated as not equivalent. This agrees with
JavaScript semantics. Perform any required normalization before matching.

# Comparison to regex crate

rebex supports features that regex does not, in particular backreferences and
zero-width lookaround assertions. However the regex crate provides
linear-time matching guarantees, while rebex does not: it uses classical
backtracking, bounded by an explicit depth limit and a step budget which
surface as a [`StackOverflow`] error rather than a hang.

# Architecture

rebex has a parser producing a node tree, an optimizer which acts on the
tree, a bytecode compiler, and a backtracking bytecode interpreter. The
bytecode buffer is self-contained: it carries its own header with the flags
and capture counts, so it may be persisted and executed later without the
pattern text.

*/

#![warn(clippy::all)]
#![allow(clippy::match_like_matches_macro)]
// Clippy's manual_range_contains suggestion produces worse codegen.
#![allow(clippy::manual_range_contains)]

pub use crate::api::*;
pub use crate::bytecode::disassemble;
pub use crate::executor::StackOverflow;
pub use crate::types::{Error, SyntaxFlags};

mod api;
mod bytecode;
mod canonical;
mod charclasses;
mod codepointset;
mod executor;
mod indexing;
mod node;
mod parse;
mod types;
mod unicodetables;
mod util;
