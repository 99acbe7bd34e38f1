quantity!(TonnesPerHectare, suffix: "t/ha", precision: 2);
