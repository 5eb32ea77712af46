//! Mutation tests: damaged documents must still convert to balanced HTML.

use smd_core::to_html;

const VARIANT_COUNT: usize = 200;
const MAX_MUTATION_STEPS: usize = 6;

const SAMPLE: &str = "# Release notes

Intro with *emphasis*, **strong**, `code` and $x^2$.
See [the docs](https://example.com/(v2)) or <team@example.com>.

> A quote
> * with a list
>   continued here
> * second item
>
> closing words

1. first
2. second
   ```sh
   make all
   ```
10. tenth

| Name | Value |
| ---- | ----- |
| a \\| b | *c* |

:::
Aside body
- nested item
:::

+++ More *details*
$$
e = mc^2
$$
+++

Setext title
============

= term: *definition*
= bare term

Footnote ref[^n].

[^n]: The note
  continues.

    indented code
---
";

const NOISE: &[u8] = b"*`$[]()!\\#>-+|:= &^\t";

const MUTATIONS: &[&str] = &[
    "drop_fence_end",
    "drop_blank_line",
    "drop_quote_marker",
    "strip_list_marker",
    "indent_line",
    "duplicate_line",
    "insert_noise",
    "truncate_tail",
];

/// Tags whose opening and closing counts must agree.
const BALANCED: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "ul", "ol", "li", "aside", "details",
    "summary", "pre", "code", "table", "thead", "tbody", "tr", "th", "td", "em", "strong", "a",
    "sup", "dl", "dt", "dd",
];

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn choose(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u32() as usize) % max
    }
}

/// Byte offset of the start of a random line.
fn pick_line(input: &str, rng: &mut Lcg) -> usize {
    let starts: Vec<usize> = std::iter::once(0)
        .chain(input.match_indices('\n').map(|(i, _)| i + 1))
        .filter(|&i| i < input.len())
        .collect();
    if starts.is_empty() {
        return 0;
    }
    starts[rng.choose(starts.len())]
}

fn apply_mutations(mut input: String, rng: &mut Lcg) -> String {
    let steps = rng.choose(MAX_MUTATION_STEPS) + 1;
    for _ in 0..steps {
        match MUTATIONS[rng.choose(MUTATIONS.len())] {
            "drop_fence_end" => {
                let fence = ["```\n", ":::\n", "+++\n", "$$\n"][rng.choose(4)];
                if let Some(pos) = input.rfind(fence) {
                    input.replace_range(pos..pos + fence.len(), "");
                }
            }
            "drop_blank_line" => {
                if let Some(pos) = input.find("\n\n") {
                    input.replace_range(pos..pos + 2, "\n");
                }
            }
            "drop_quote_marker" => {
                if let Some(pos) = input.find("> ") {
                    input.replace_range(pos..pos + 2, "");
                }
            }
            "strip_list_marker" => {
                if let Some(pos) = input.find("* ").or_else(|| input.find("- ")) {
                    input.replace_range(pos..pos + 2, "");
                }
            }
            "indent_line" => {
                let pos = pick_line(&input, rng);
                input.insert_str(pos, ["  ", "    ", "\t", "> "][rng.choose(4)]);
            }
            "duplicate_line" => {
                let pos = pick_line(&input, rng);
                let end = input[pos..].find('\n').map_or(input.len(), |i| pos + i + 1);
                let line = input[pos..end].to_string();
                input.insert_str(pos, &line);
            }
            "insert_noise" => {
                let pos = rng.choose(input.len() + 1);
                let noise = NOISE[rng.choose(NOISE.len())] as char;
                input.insert(pos, noise);
            }
            "truncate_tail" => {
                let len = input.len();
                if len > 8 {
                    let cut = rng.choose(len / 4).max(1);
                    input.truncate(len - cut);
                }
            }
            _ => {}
        }
    }
    input
}

fn count_open(html: &str, tag: &str) -> usize {
    html.matches(&format!("<{tag}>")).count() + html.matches(&format!("<{tag} ")).count()
}

fn count_close(html: &str, tag: &str) -> usize {
    html.matches(&format!("</{tag}>")).count()
}

fn assert_balanced(input: &str, html: &str) {
    for tag in BALANCED {
        assert_eq!(
            count_open(html, tag),
            count_close(html, tag),
            "unbalanced <{tag}> for input:\n{input}\n---\n{html}"
        );
    }
}

#[test]
fn sample_converts_balanced() {
    let html = to_html(SAMPLE).unwrap();
    assert_balanced(SAMPLE, &html);
    assert!(html.contains("<details>\n<summary>More <em>details</em></summary>\n"));
    assert!(html.contains("<h1>Setext title</h1>\n"));
}

#[test]
fn mutated_documents_convert_balanced() {
    for seed in [1u64, 7, 42, 2024] {
        let mut rng = Lcg::new(seed);
        for _ in 0..VARIANT_COUNT {
            let input = apply_mutations(SAMPLE.to_string(), &mut rng);
            let html = to_html(&input).unwrap();
            assert_balanced(&input, &html);
        }
    }
}

#[test]
fn deep_nesting_is_bounded() {
    let input = format!("{} deep\n", "> ".repeat(1000));
    let html = to_html(&input).unwrap();
    assert_eq!(html.matches("<blockquote>").count(), 256);
    assert_balanced(&input, &html);
}
