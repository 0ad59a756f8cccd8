pub mod ms5611;
