//! Line-oriented text format for trained networks.
//!
//! ```text
//! <layer count>
//! <size_0> <size_1> ... <size_n-1>
//! <hidden activation code> <output activation code>
//! <layer 1 weights, row-major>
//! <layer 1 biases>
//! ...one weights line and one biases line per non-input layer
//! ```
//!
//! Values are written with the shortest representation that parses back to
//! the same `f64`, so a save/load round trip is exact. The cost function is
//! not stored.

use log::info;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::dense::Layer;
use crate::loss::cost::Cost;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

impl Network {
    /// Writes the network to `path` in the text format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!("saved network {:?} to {}", self.layer_sizes(), path.display());
        Ok(())
    }

    /// Reads a network written by `save`. The cost function is MSE; swap it
    /// with `with_cost`.
    pub fn load(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let network = Network::read_from(BufReader::new(File::open(path)?))?;
        info!("loaded network {:?} from {}", network.layer_sizes(), path.display());
        Ok(network)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.to_text().as_bytes())?;
        Ok(())
    }

    pub fn read_from<R: BufRead>(mut reader: R) -> Result<Network> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Network::from_text(&text)
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        text.push_str(&self.layer_sizes().len().to_string());
        text.push('\n');
        text.push_str(&join(self.layer_sizes()));
        text.push('\n');
        text.push_str(&join([self.hidden_activation().code(), self.output_activation().code()]));
        text.push('\n');

        for layer in self.layers().iter().skip(1) {
            text.push_str(&join(layer.weights().as_slice()));
            text.push('\n');
            text.push_str(&join(layer.biases().as_slice()));
            text.push('\n');
        }

        text
    }

    pub fn from_text(text: &str) -> Result<Network> {
        let mut cursor = LineCursor { lines: text.lines(), line: 0 };

        let (line, content) = cursor.next("layer count")?;
        let layer_count = parse_exact::<usize>(line, content, 1, "layer count")?[0];
        if layer_count < 2 {
            return Err(NetworkError::parse(line, format!("layer count must be at least 2, got {layer_count}")));
        }

        let (line, content) = cursor.next("layer sizes")?;
        let layer_sizes = parse_exact::<usize>(line, content, layer_count, "layer size")?;
        if let Some(i) = layer_sizes.iter().position(|&size| size == 0) {
            return Err(NetworkError::parse(line, format!("layer {i} has zero nodes")));
        }
        let weight_counts = layer_sizes
            .windows(2)
            .map(|pair| {
                pair[0].checked_mul(pair[1]).ok_or_else(|| {
                    NetworkError::parse(line, format!("a {}x{} weight matrix is too large", pair[0], pair[1]))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let (line, content) = cursor.next("activation codes")?;
        let codes = parse_exact::<i64>(line, content, 2, "activation code")?;
        let hidden = ActivationFunction::from_code(codes[0])?;
        let output = ActivationFunction::from_code(codes[1])?;

        let mut layers = Vec::with_capacity(layer_count);
        layers.push(Layer::input(layer_sizes[0]));
        for (pair, &weight_count) in layer_sizes.windows(2).zip(&weight_counts) {
            let (input_size, size) = (pair[0], pair[1]);

            let (line, content) = cursor.next("layer weights")?;
            let weights = parse_exact::<f64>(line, content, weight_count, "weight")?;
            let (line, content) = cursor.next("layer biases")?;
            let biases = parse_exact::<f64>(line, content, size, "bias")?;

            layers.push(Layer::from_parameters(
                Matrix::from_vec(input_size, size, weights)?,
                Matrix::from_vec(1, size, biases)?,
            )?);
        }

        if let Some((line, _)) = cursor.remaining_content() {
            return Err(NetworkError::parse(line, "unexpected content after the last layer"));
        }

        Network::from_layers(layer_sizes, layers, hidden, output, Cost::Mse)
    }
}

struct LineCursor<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> LineCursor<'a> {
    fn next(&mut self, what: &str) -> Result<(usize, &'a str)> {
        self.line += 1;
        let line = self.line;
        self.lines
            .next()
            .map(|content| (line, content))
            .ok_or_else(|| NetworkError::parse(line, format!("unexpected end of input, expected {what}")))
    }

    /// First non-blank line left over, if any.
    fn remaining_content(&mut self) -> Option<(usize, &'a str)> {
        for content in self.lines.by_ref() {
            self.line += 1;
            if !content.trim().is_empty() {
                return Some((self.line, content));
            }
        }
        None
    }
}

fn parse_exact<T>(line: usize, content: &str, count: usize, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let values = content
        .split_whitespace()
        .map(|token| {
            token.parse::<T>().map_err(|e| {
                NetworkError::parse(line, format!("invalid {what} {token:?}: {e}"))
            })
        })
        .collect::<Result<Vec<T>>>()?;

    if values.len() != count {
        return Err(NetworkError::parse(
            line,
            format!("expected {count} {what} value(s), found {}", values.len()),
        ));
    }
    Ok(values)
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
