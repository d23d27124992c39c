use super::Measurements;
use crate::data_access::DataAccess;
use crate::errors::Result;

pub type MetricFn<D> = fn(&mut Measurements<D>) -> Result<String>;

/// A named metric and the computation behind it.
pub struct MetricEntry<D: DataAccess> {
    pub name: &'static str,
    pub description: &'static str,
    pub compute: MetricFn<D>,
}

// Manual impls, the derives would require `D: Clone`.
impl<D: DataAccess> Clone for MetricEntry<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DataAccess> Copy for MetricEntry<D> {}

impl<D: DataAccess> std::fmt::Debug for MetricEntry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

fn entry<D: DataAccess>(
    name: &'static str,
    description: &'static str,
    compute: MetricFn<D>,
) -> MetricEntry<D> {
    MetricEntry {
        name,
        description,
        compute,
    }
}

/// Every metric, in the order reports list them.
pub fn catalog<D: DataAccess>() -> Vec<MetricEntry<D>> {
    vec![
        entry(
            "C_1A",
            "Fraction of identified peptides eluting more than 4 min after their fragmentation",
            Measurements::c_1a,
        ),
        entry(
            "C_1B",
            "Fraction of identified peptides eluting more than 4 min before their fragmentation",
            Measurements::c_1b,
        ),
        entry(
            "C_2A",
            "Minutes spanned by the middle 50% of identified peptides",
            Measurements::c_2a,
        ),
        entry(
            "C_2B",
            "Unique peptides first identified per minute of the middle elution window",
            Measurements::c_2b,
        ),
        entry(
            "C_3A",
            "Median peak width (s) of identified peptides",
            Measurements::c_3a,
        ),
        entry(
            "C_3B",
            "Median peak width (s) over the middle 50% of the elution order",
            Measurements::c_3b,
        ),
        entry(
            "C_4A",
            "Median peak width (s) over the first 10% of the elution order",
            Measurements::c_4a,
        ),
        entry(
            "C_4B",
            "Median peak width (s) over the last 10% of the elution order",
            Measurements::c_4b,
        ),
        entry(
            "C_4C",
            "Median peak width (s) over the middle 10% of the elution order",
            Measurements::c_4c,
        ),
        entry(
            "DS_1A",
            "Peptides identified once over peptides identified twice",
            Measurements::ds_1a,
        ),
        entry(
            "DS_1B",
            "Peptides identified twice over peptides identified three times",
            Measurements::ds_1b,
        ),
        entry(
            "DS_2A",
            "MS1 scans inside the middle elution window",
            Measurements::ds_2a,
        ),
        entry(
            "DS_2B",
            "MS2 scans inside the middle elution window",
            Measurements::ds_2b,
        ),
        entry(
            "DS_3A",
            "Median ratio of peak maximum to sampled precursor intensity",
            Measurements::ds_3a,
        ),
        entry(
            "DS_3B",
            "Median ratio of peak maximum to sampled precursor intensity, bottom half by intensity",
            Measurements::ds_3b,
        ),
        entry(
            "IS_1A",
            "MS1 total ion current drops of more than 10x",
            Measurements::is_1a,
        ),
        entry(
            "IS_1B",
            "MS1 total ion current jumps of more than 10x",
            Measurements::is_1b,
        ),
        entry(
            "IS_2",
            "Median precursor m/z of unique identified peptides",
            Measurements::is_2,
        ),
        entry(
            "IS_3A",
            "Ratio of 1+ to 2+ identified spectra",
            Measurements::is_3a,
        ),
        entry(
            "IS_3B",
            "Ratio of 3+ to 2+ identified spectra",
            Measurements::is_3b,
        ),
        entry(
            "IS_3C",
            "Ratio of 4+ to 2+ identified spectra",
            Measurements::is_3c,
        ),
        entry(
            "MS1_1",
            "Median MS1 ion injection time (ms)",
            Measurements::ms1_1,
        ),
        entry(
            "MS1_2A",
            "Median MS1 base peak signal to noise inside the middle elution window",
            Measurements::ms1_2a,
        ),
        entry(
            "MS1_2B",
            "Median MS1 total ion current (thousands) inside the middle elution window",
            Measurements::ms1_2b,
        ),
        entry(
            "MS1_3A",
            "Dynamic range: 95th over 5th percentile of identified peak maxima",
            Measurements::ms1_3a,
        ),
        entry(
            "MS1_3B",
            "Median peak maximum of identified peptides",
            Measurements::ms1_3b,
        ),
        entry(
            "MS1_5A",
            "Median precursor mass error (Da)",
            Measurements::ms1_5a,
        ),
        entry(
            "MS1_5B",
            "Mean absolute precursor mass error (Da)",
            Measurements::ms1_5b,
        ),
        entry(
            "MS1_5C",
            "Median precursor mass error (ppm)",
            Measurements::ms1_5c,
        ),
        entry(
            "MS1_5D",
            "Interquartile range of precursor mass error (ppm)",
            Measurements::ms1_5d,
        ),
        entry(
            "MS2_1",
            "Median MS2 ion injection time of identified scans (ms)",
            Measurements::ms2_1,
        ),
        entry(
            "MS2_2",
            "Median MS2 base peak signal to noise of identified scans",
            Measurements::ms2_2,
        ),
        entry(
            "MS2_3",
            "Median number of peaks in identified MS2 scans",
            Measurements::ms2_3,
        ),
        entry(
            "MS2_4A",
            "Fraction of MS2 scans identified, first precursor intensity quartile",
            Measurements::ms2_4a,
        ),
        entry(
            "MS2_4B",
            "Fraction of MS2 scans identified, second precursor intensity quartile",
            Measurements::ms2_4b,
        ),
        entry(
            "MS2_4C",
            "Fraction of MS2 scans identified, third precursor intensity quartile",
            Measurements::ms2_4c,
        ),
        entry(
            "MS2_4D",
            "Fraction of MS2 scans identified, fourth precursor intensity quartile",
            Measurements::ms2_4d,
        ),
        entry(
            "P_1A",
            "Median identification score of passing identifications",
            Measurements::p_1a,
        ),
        entry(
            "P_1B",
            "Median identification score of all identifications",
            Measurements::p_1b,
        ),
        entry(
            "P_2A",
            "Fully tryptic identified spectra",
            Measurements::p_2a,
        ),
        entry(
            "P_2B",
            "Fully tryptic unique peptide and charge combinations",
            Measurements::p_2b,
        ),
        entry(
            "P_2C",
            "Fully tryptic unique peptides",
            Measurements::p_2c,
        ),
        entry(
            "P_3",
            "Partially over fully tryptic unique peptides",
            Measurements::p_3,
        ),
        entry(
            "P_4A",
            "Fully tryptic share of unique identified peptides",
            Measurements::p_4a,
        ),
    ]
}
