//! Class label encoding

use ndarray::Array1;

/// Maps textual class labels onto contiguous class indices.
///
/// Classes are kept sorted so the encoding does not depend on row order.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Collect the distinct labels of every given partition
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a Option<String>>,
    {
        let mut classes: Vec<String> = labels.into_iter().flatten().cloned().collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// Encode the labelled rows of `labels`, returning their positions too
    pub fn encode_labelled(&self, labels: &[Option<String>]) -> (Vec<usize>, Array1<f64>) {
        let (rows, classes): (Vec<usize>, Vec<f64>) = labels
            .iter()
            .enumerate()
            .filter_map(|(row, label)| {
                let class = self.encode(label.as_deref()?)?;
                Some((row, class as f64))
            })
            .unzip();
        (rows, Array1::from_vec(classes))
    }
}
