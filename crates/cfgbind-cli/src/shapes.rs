//! Config types for the shapes binary.

use std::f64::consts::PI;

use cfgbind_engine::{
    ConfigSection, ConfigType, Constraint, Field, HandlerResult, Registry, Result,
};
use serde::Deserialize;

use crate::output::draw_line;

/// Phases run over every parsed shape.
pub const PHASES: [&str; 1] = ["draw"];

/// A circle.
#[derive(Debug, Deserialize)]
pub struct Circle {
    radius: f64,
    color: String,
}

impl Circle {
    fn check(&self) -> HandlerResult {
        if self.radius < 0.0 {
            return Err("circle radius cannot be negative".into());
        }
        Ok(())
    }

    fn draw(&self) {
        let area = PI * self.radius * self.radius;
        println!(
            "{}",
            draw_line(&self.color, "circle", &[("radius", self.radius)], area)
        );
    }
}

/// A rectangle.
#[derive(Debug, Deserialize)]
pub struct Rectangle {
    width: f64,
    height: f64,
    color: String,
}

impl Rectangle {
    fn check(&self) -> HandlerResult {
        if self.width < 0.0 || self.height < 0.0 {
            return Err("rectangle height and width cannot be negative".into());
        }
        Ok(())
    }

    fn draw(&self) {
        let dims = [("height", self.height), ("width", self.width)];
        println!(
            "{}",
            draw_line(&self.color, "rectangle", &dims, self.width * self.height)
        );
    }
}

/// Prints the binary version and nothing else.
#[derive(Debug, Deserialize)]
pub struct Version {}

fn infallible<T: 'static>(draw: fn(&T)) -> impl Fn(&T) -> HandlerResult + Send + Sync + 'static {
    move |shape: &T| {
        draw(shape);
        Ok(())
    }
}

/// Builds the shapes registry.
///
/// # Errors
///
/// Returns a registration error if a type declaration is invalid.
pub fn registry() -> Result<Registry> {
    let mut builder = Registry::builder();
    let shapes = builder.add_section(ConfigSection::new("Shapes", 1));

    let _ = builder
        .register(
            ConfigType::<Circle>::new("circle", "Circle Shape")
                .constraint(Constraint::Section(shapes))
                .field(
                    Field::float("radius")
                        .description("Radius of the circle")
                        .bare_value()
                        .required(),
                )
                .field(
                    Field::string("color")
                        .description("Color to use when drawing the circle")
                        .default_value("white"),
                )
                .check(Circle::check)
                .phase("draw", infallible(Circle::draw)),
        )?
        .register(
            ConfigType::<Rectangle>::new("rectangle", "Rectangle Shape")
                .constraint(Constraint::Section(shapes))
                .field(
                    Field::float("width")
                        .tags(r#"description:"Width of the rectangle" required:"yes""#),
                )
                .field(
                    Field::float("height")
                        .tags(r#"description:"Height of the rectangle" required:"yes""#),
                )
                .field(
                    Field::string("color")
                        .description("Color to use when drawing the rectangle")
                        .default_value("white"),
                )
                .check(Rectangle::check)
                .phase("draw", infallible(Rectangle::draw)),
        )?
        .register(
            ConfigType::<Version>::new("version", "Show the version and exit")
                .constraint(Constraint::Exclusive)
                .phase("draw", |_: &Version| {
                    println!("shapes {}", env!("CARGO_PKG_VERSION"));
                    Ok(())
                }),
        )?;

    Ok(builder.freeze())
}
