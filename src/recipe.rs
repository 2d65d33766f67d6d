//! Recipe loading and rendering.
//!
//! Crafting pages carry recipe *references* (`namespace:path/to/recipe`), not
//! recipe data. The data lives in the mod's data tree as
//! `<data>/<namespace>/recipes/<path>.json`, in one of a few loosely
//! specified shapes. This module loads a reference, classifies the JSON into
//! a [`RecipeData`] variant, and renders it as an HTML table.
//!
//! Everything here is fail-soft: a reference that cannot be loaded, parsed,
//! or classified records a warning and contributes nothing to the page.

use crate::context::RenderContext;
use crate::knapping::KnappingGrid;
use crate::markup::tooltip;
use crate::model::strip_namespace;
use maud::{html, PreEscaped};
use serde_json::Value;
use std::collections::BTreeMap;

/// A recipe classified into one of the shapes the renderer knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeData {
    /// One ingredient in, one result out.
    Pair { ingredient: String, result: String },
    /// A 2D grid of symbols with a symbol-to-ingredient mapping.
    Shaped {
        pattern: Vec<String>,
        key: BTreeMap<String, String>,
        result: String,
    },
    /// A knapping pattern: struck/untouched cells, no symbol mapping.
    Knapping {
        pattern: Vec<String>,
        result: String,
    },
}

impl RecipeData {
    /// The grid for knapping recipes, `None` for the other shapes.
    pub fn knapping_grid(&self) -> Option<KnappingGrid> {
        match self {
            RecipeData::Knapping { pattern, .. } => Some(KnappingGrid::from_rows(pattern)),
            _ => None,
        }
    }
}

/// Load and classify a recipe by reference. Failures warn and return `None`.
pub fn load_recipe(ctx: &mut RenderContext, reference: &str) -> Option<RecipeData> {
    let (namespace, rel_path) = match reference.split_once(':') {
        Some(parts) => parts,
        None => ("", reference),
    };

    let mut path = ctx.data_dir.clone();
    if !namespace.is_empty() {
        path.push(namespace);
    }
    path.push("recipes");
    path.push(format!("{rel_path}.json"));

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            ctx.warn(format!(
                "Cannot read recipe {reference} (at {}): {err}",
                path.display()
            ));
            return None;
        }
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            ctx.warn(format!("Recipe {reference} is not valid JSON: {err}"));
            return None;
        }
    };

    match parse_recipe(&value) {
        Some(data) => Some(data),
        None => {
            ctx.warn(format!("Recipe {reference} has an unrecognized shape"));
            None
        }
    }
}

/// Classify a recipe JSON object.
///
/// Shapes are detected structurally rather than by the `type` tag, since tags
/// vary per mod: a `pattern` with a `key` is a shaped grid, a `pattern`
/// without one is a knapping pattern, and anything else with an ingredient
/// and a result is a pair.
fn parse_recipe(value: &Value) -> Option<RecipeData> {
    let obj = value.as_object()?;

    let result = obj
        .get("result")
        .and_then(item_name)
        .or_else(|| obj.get("results").and_then(item_name))?;

    if let Some(pattern) = obj.get("pattern") {
        let pattern: Vec<String> = pattern
            .as_array()?
            .iter()
            .map(|row| row.as_str().map(str::to_string))
            .collect::<Option<_>>()?;

        return match obj.get("key") {
            Some(key) => {
                let key = key
                    .as_object()?
                    .iter()
                    .map(|(symbol, v)| item_name(v).map(|name| (symbol.clone(), name)))
                    .collect::<Option<BTreeMap<_, _>>>()?;
                Some(RecipeData::Shaped {
                    pattern,
                    key,
                    result,
                })
            }
            None => Some(RecipeData::Knapping { pattern, result }),
        };
    }

    let ingredient = obj
        .get("ingredient")
        .or_else(|| obj.get("ingredients"))
        .or_else(|| obj.get("input"))
        .and_then(item_name)?;

    Some(RecipeData::Pair { ingredient, result })
}

/// Pull an item/tag/fluid identifier out of the many shapes ingredients and
/// results take: a bare string, an object with an `item`/`tag`/`fluid`/`id`
/// field (possibly nested under `stack`), or an array of alternatives (first
/// one wins).
fn item_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(item_name),
        Value::Object(obj) => {
            for field in ["item", "tag", "fluid", "id"] {
                if let Some(Value::String(s)) = obj.get(field) {
                    return Some(s.clone());
                }
            }
            obj.get("stack").and_then(item_name)
        }
        _ => None,
    }
}

/// Human-readable form of an item identifier: namespace stripped, underscores
/// spaced (`mymod:igneous/flint_axe_head` becomes `igneous/flint axe head`).
pub fn display_name(id: &str) -> String {
    strip_namespace(id).replace('_', " ")
}

/// Caption text for a recipe, derived from its result.
pub fn recipe_label(data: &RecipeData) -> String {
    let result = match data {
        RecipeData::Pair { result, .. } => result,
        RecipeData::Shaped { result, .. } => result,
        RecipeData::Knapping { result, .. } => result,
    };
    display_name(result)
}

/// Render a page's recipe reference field into the buffer. Accepts `None`
/// (page has no secondary recipe) so call sites stay unconditional.
pub fn render_recipe(ctx: &mut RenderContext, buffer: &mut Vec<String>, reference: Option<&str>) {
    let Some(reference) = reference else {
        return;
    };
    let Some(data) = load_recipe(ctx, reference) else {
        return;
    };
    buffer.push(render_recipe_data(ctx, &data));
}

/// Render classified recipe data as an HTML fragment.
pub fn render_recipe_data(ctx: &mut RenderContext, data: &RecipeData) -> String {
    match data {
        RecipeData::Pair { ingredient, result } => html! {
            table class="gb-recipe" {
                tr {
                    td { (item_cell(ingredient)) }
                    td class="gb-recipe-arrow" { "\u{2192}" }
                    td { (item_cell(result)) }
                }
            }
        }
        .into_string(),
        RecipeData::Shaped {
            pattern,
            key,
            result,
        } => {
            let caption = display_name(result);
            html! {
                table class="gb-recipe gb-recipe-grid" {
                    caption { (caption) }
                    @for row in pattern {
                        tr {
                            @for symbol in row.chars() {
                                (grid_cell(ctx, key, symbol))
                            }
                        }
                    }
                }
            }
            .into_string()
        }
        RecipeData::Knapping { result, .. } => {
            // The raster carries the pattern; here only the outcome.
            let caption = format!("Knapping result: {}", display_name(result));
            html! {
                p class="gb-center" { (caption) }
            }
            .into_string()
        }
    }
}

fn item_cell(id: &str) -> PreEscaped<String> {
    let code = html! { code { (id) } }.into_string();
    PreEscaped(tooltip(&code, &display_name(id)))
}

fn grid_cell(
    ctx: &mut RenderContext,
    key: &BTreeMap<String, String>,
    symbol: char,
) -> PreEscaped<String> {
    if symbol == ' ' {
        return PreEscaped("<td class=\"gb-recipe-empty\"></td>".to_string());
    }
    match key.get(&symbol.to_string()) {
        Some(ingredient) => {
            let inner = html! { (symbol) }.into_string();
            let cell = tooltip(&inner, &display_name(ingredient));
            PreEscaped(format!("<td>{cell}</td>"))
        }
        None => {
            ctx.warn(format!("Recipe grid symbol has no key entry: {symbol}"));
            PreEscaped("<td class=\"gb-recipe-empty\"></td>".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{disk_context, test_context};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_recipe(root: &std::path::Path, rel: &str, json: &str) {
        let path = root.join("data").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, json).unwrap();
    }

    #[test]
    fn pair_recipe_from_ingredient_object() {
        let value: Value = serde_json::from_str(
            r#"{
                "type": "mymod:quern",
                "ingredient": { "item": "mymod:barley" },
                "result": { "item": "mymod:barley_flour", "count": 2 }
            }"#,
        )
        .unwrap();
        assert_eq!(
            parse_recipe(&value),
            Some(RecipeData::Pair {
                ingredient: "mymod:barley".to_string(),
                result: "mymod:barley_flour".to_string(),
            })
        );
    }

    #[test]
    fn pair_recipe_from_tag_and_array() {
        let value: Value = serde_json::from_str(
            r#"{
                "ingredients": [{ "tag": "forge:rods/wooden" }, { "item": "mymod:flint" }],
                "result": "mymod:axe"
            }"#,
        )
        .unwrap();
        assert_eq!(
            parse_recipe(&value),
            Some(RecipeData::Pair {
                ingredient: "forge:rods/wooden".to_string(),
                result: "mymod:axe".to_string(),
            })
        );
    }

    #[test]
    fn shaped_recipe_with_key() {
        let value: Value = serde_json::from_str(
            r#"{
                "pattern": ["XX", "X "],
                "key": { "X": { "item": "mymod:rock" } },
                "result": { "item": "mymod:wall" }
            }"#,
        )
        .unwrap();
        let data = parse_recipe(&value).unwrap();
        match &data {
            RecipeData::Shaped { pattern, key, .. } => {
                assert_eq!(pattern, &vec!["XX".to_string(), "X ".to_string()]);
                assert_eq!(key.get("X").unwrap(), "mymod:rock");
            }
            other => panic!("expected shaped recipe, got {other:?}"),
        }
    }

    #[test]
    fn pattern_without_key_is_knapping() {
        let value: Value = serde_json::from_str(
            r#"{
                "pattern": [" X ", "XXX", " X "],
                "result": { "item": "mymod:axe_head" }
            }"#,
        )
        .unwrap();
        let data = parse_recipe(&value).unwrap();
        let grid = data.knapping_grid().unwrap();
        assert_eq!(grid.active_count(), 5);
        assert_eq!(recipe_label(&data), "axe head");
    }

    #[test]
    fn recipe_without_result_is_unrecognized() {
        let value: Value =
            serde_json::from_str(r#"{ "ingredient": { "item": "mymod:x" } }"#).unwrap();
        assert_eq!(parse_recipe(&value), None);
    }

    #[test]
    fn display_name_strips_and_spaces() {
        assert_eq!(display_name("mymod:flint_axe_head"), "flint axe head");
        assert_eq!(display_name("plain"), "plain");
    }

    #[test]
    fn load_resolves_namespaced_path() {
        let tmp = TempDir::new().unwrap();
        write_recipe(
            tmp.path(),
            "mymod/recipes/quern/flour.json",
            r#"{ "ingredient": "mymod:barley", "result": "mymod:flour" }"#,
        );
        let mut ctx = disk_context(tmp.path());

        let data = load_recipe(&mut ctx, "mymod:quern/flour").unwrap();
        assert_eq!(
            data,
            RecipeData::Pair {
                ingredient: "mymod:barley".to_string(),
                result: "mymod:flour".to_string(),
            }
        );
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn missing_recipe_warns_and_skips() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = disk_context(tmp.path());

        let mut buffer = Vec::new();
        render_recipe(&mut ctx, &mut buffer, Some("mymod:nope"));
        assert!(buffer.is_empty());
        assert_eq!(ctx.warning_count(), 1);
    }

    #[test]
    fn malformed_recipe_json_warns_and_skips() {
        let tmp = TempDir::new().unwrap();
        write_recipe(tmp.path(), "mymod/recipes/bad.json", "{ not json");
        let mut ctx = disk_context(tmp.path());

        assert!(load_recipe(&mut ctx, "mymod:bad").is_none());
        assert_eq!(ctx.warning_count(), 1);
    }

    #[test]
    fn pair_renders_two_cells_with_arrow() {
        let mut ctx = test_context();
        let html = render_recipe_data(
            &mut ctx,
            &RecipeData::Pair {
                ingredient: "mymod:barley".to_string(),
                result: "mymod:flour".to_string(),
            },
        );
        assert!(html.contains("gb-recipe"));
        assert!(html.contains("\u{2192}"));
        assert!(html.contains("<code>mymod:barley</code>"));
        assert!(html.contains("title=\"flour\""));
    }

    #[test]
    fn shaped_renders_cell_per_symbol() {
        let mut ctx = test_context();
        let key = BTreeMap::from([("X".to_string(), "mymod:rock".to_string())]);
        let html = render_recipe_data(
            &mut ctx,
            &RecipeData::Shaped {
                pattern: vec!["X ".to_string()],
                key,
                result: "mymod:wall".to_string(),
            },
        );
        assert_eq!(html.matches("<td").count(), 2);
        assert!(html.contains("title=\"rock\""));
        assert!(html.contains("gb-recipe-empty"));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn unmapped_symbol_is_empty_cell_with_warning() {
        let mut ctx = test_context();
        let html = render_recipe_data(
            &mut ctx,
            &RecipeData::Shaped {
                pattern: vec!["XY".to_string()],
                key: BTreeMap::from([("X".to_string(), "mymod:rock".to_string())]),
                result: "mymod:wall".to_string(),
            },
        );
        assert_eq!(html.matches("<td").count(), 2);
        assert!(html.contains("gb-recipe-empty"));
        assert_eq!(ctx.warning_count(), 1);
    }

    #[test]
    fn absent_reference_renders_nothing() {
        let mut ctx = test_context();
        let mut buffer = Vec::new();
        render_recipe(&mut ctx, &mut buffer, None);
        assert!(buffer.is_empty());
        assert!(ctx.diagnostics.is_empty());
    }
}
