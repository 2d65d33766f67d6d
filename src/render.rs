//! The page dispatcher.
//!
//! Each [`PageKind`] renders as a fixed sequence of fragments appended to the
//! entry's buffer. The order per kind is part of the output contract (a
//! crafting page is always title, recipe, secondary recipe, text), and a page
//! with an anchor wraps its whole sequence in an id'd `<div>` so markup links
//! can deep-link to it.
//!
//! Unknown page kinds warn and contribute nothing; the rest of the entry
//! still renders.

use crate::context::RenderContext;
use crate::images::resolve_image;
use crate::knapping::render_knapping;
use crate::markup::{
    escape_html, format_centered_text, format_text, format_title, tooltip,
};
use crate::model::{Page, PageKind};
use crate::recipe::{load_recipe, recipe_label, render_recipe, render_recipe_data};
use maud::{html, PreEscaped};

/// Render one page into the buffer.
pub fn render_page(ctx: &mut RenderContext, page: &Page, buffer: &mut Vec<String>) {
    if let Some(anchor) = &page.anchor {
        buffer.push(format!("<div id=\"anchor-{}\">", escape_html(anchor)));
    }

    match &page.kind {
        PageKind::Text(p) => {
            format_title(ctx, buffer, p.title.as_deref());
            format_text(ctx, buffer, Some(&p.text));
        }
        PageKind::Image(p) => {
            format_title(ctx, buffer, p.title.as_deref());
            render_images(ctx, buffer, &p.images);
            format_centered_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Crafting(p) => {
            format_title(ctx, buffer, p.title.as_deref());
            render_recipe(ctx, buffer, p.recipe.as_deref());
            render_recipe(ctx, buffer, p.recipe2.as_deref());
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Spotlight(p) => {
            format_title(ctx, buffer, p.title.as_deref());
            let label = html! { "Item: " code { (p.item) } }.into_string();
            buffer.push(tooltip(&label, "View the field guide in game to see items."));
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Entity(p) => {
            format_title(ctx, buffer, p.name.as_deref());
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Empty => buffer.push("<hr>".to_string()),
        PageKind::Multiblock(p) => {
            format_title(ctx, buffer, p.name.as_deref());
            if let Some(spec) = &p.multiblock {
                if let Some(block) = spec.single_block() {
                    let label = html! { "Block: " code { (block) } }.into_string();
                    buffer.push(tooltip(
                        &label,
                        "View the field guide in game to see blocks.",
                    ));
                }
            } else if let Some(id) = &p.multiblock_id {
                let label = html! { "Multiblock: " code { (id) } }.into_string();
                buffer.push(tooltip(
                    &label,
                    "View the field guide in game to see multiblocks.",
                ));
            }
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Device(p) => {
            render_recipe(ctx, buffer, Some(&p.recipe));
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Knapping(p) => {
            render_knapping_page(ctx, buffer, &p.recipe);
            format_text(ctx, buffer, p.text.as_deref());
        }
        PageKind::Unknown(tag) => {
            ctx.warn(format!("Unrecognized page type: {tag}"));
        }
    }

    if page.anchor.is_some() {
        buffer.push("</div>".to_string());
    }
}

/// Knapping recipe page body: the rasterized pattern, then the result.
fn render_knapping_page(ctx: &mut RenderContext, buffer: &mut Vec<String>, reference: &str) {
    let Some(data) = load_recipe(ctx, reference) else {
        return;
    };
    let Some(grid) = data.knapping_grid() else {
        ctx.warn(format!("Recipe {reference} is not a knapping pattern"));
        return;
    };

    if let Some(filename) = render_knapping(ctx, &grid) {
        let src = ctx.href_to_image(&filename);
        let alt = format!("Recipe: {}", recipe_label(&data));
        buffer.push(single_image(ctx, &src, &alt));
    }
    buffer.push(render_recipe_data(ctx, &data));
}

/// The image carousel: one frame for a single image, indicator dots and
/// prev/next controls when there are several.
fn render_images(ctx: &mut RenderContext, buffer: &mut Vec<String>, images: &[String]) {
    match images {
        [] => ctx.warn("Image page with no images".to_string()),
        [image] => {
            let src = resolve_image(ctx, image);
            buffer.push(single_image(ctx, &src, image));
        }
        _ => {
            let uid = ctx.next_id();
            let sources: Vec<(String, &str)> = images
                .iter()
                .map(|image| (resolve_image(ctx, image), image.as_str()))
                .collect();
            buffer.push(
                html! {
                    div id=(uid) class="carousel slide" data-ride="carousel" {
                        ol class="carousel-indicators" {
                            @for (i, _) in sources.iter().enumerate() {
                                li data-target=(format!("#{uid}"))
                                    data-slide-to=(i)
                                    class=[(i == 0).then_some("active")] {}
                            }
                        }
                        div class="carousel-inner" {
                            @for (i, (src, alt)) in sources.iter().enumerate() {
                                div class=(if i == 0 { "carousel-item active" } else { "carousel-item" }) {
                                    img class="d-block w-200" src=(src) alt=(alt);
                                }
                            }
                        }
                        (carousel_control(&uid, "prev", "Previous"))
                        (carousel_control(&uid, "next", "Next"))
                    }
                }
                .into_string(),
            );
        }
    }
}

fn single_image(ctx: &mut RenderContext, src: &str, alt: &str) -> String {
    let uid = ctx.next_id();
    html! {
        div id=(uid) class="carousel slide" data-ride="carousel" {
            div class="carousel-inner" {
                div class="carousel-item active" {
                    img class="d-block w-200" src=(src) alt=(alt);
                }
            }
        }
    }
    .into_string()
}

fn carousel_control(uid: &str, direction: &str, label: &str) -> PreEscaped<String> {
    html! {
        a class=(format!("carousel-control-{direction}")) href=(format!("#{uid}"))
            role="button" data-slide=(direction) {
            span class=(format!("carousel-control-{direction}-icon")) aria-hidden="true" {}
            span class="sr-only" { (label) }
        }
    }
}
