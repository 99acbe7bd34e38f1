quantity!(SquareMetres, suffix: "m²", precision: 1);
